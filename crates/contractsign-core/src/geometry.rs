//! Coordinate transformation between page space and presentation space
//!
//! Page space is measured in PDF points with the origin at the bottom-left of
//! the page. Presentation space is whatever the viewer draws in: pixels, origin
//! top-left, scaled by a zoom factor. Field geometry is always persisted in page
//! space; every rectangle coming from the viewer goes through [`to_page_space`].

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle. The coordinate space is implied by the caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Same size, shifted by `(dx, dy)`
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

/// Pointer position in presentation space.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// How a page is currently presented: its height in points and the zoom factor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Viewport {
    pub page_height_pt: f64,
    pub zoom: f64,
}

impl Viewport {
    pub fn new(page_height_pt: f64, zoom: f64) -> Self {
        Self {
            page_height_pt,
            zoom,
        }
    }

    pub fn to_page_space(&self, rect: Rect) -> Rect {
        to_page_space(rect, self.page_height_pt, self.zoom)
    }

    pub fn to_presentation_space(&self, rect: Rect) -> Rect {
        to_presentation_space(rect, self.page_height_pt, self.zoom)
    }
}

/// Convert a presentation-space rectangle (pixels, top-left origin) to page space
/// (points, bottom-left origin).
///
/// Every output is rounded to the nearest whole point. Repeated round trips can
/// therefore drift by up to one point per interaction.
pub fn to_page_space(rect: Rect, page_height_pt: f64, zoom: f64) -> Rect {
    let x = rect.x / zoom;
    // Flip Y axis: the bottom edge of the rect becomes the page-space origin
    let y = page_height_pt - (rect.y + rect.height) / zoom;
    let width = rect.width / zoom;
    let height = rect.height / zoom;

    Rect {
        x: x.round(),
        y: y.round(),
        width: width.round(),
        height: height.round(),
    }
}

/// Convert a page-space rectangle back to presentation space. Exact inverse of
/// [`to_page_space`] before rounding.
pub fn to_presentation_space(rect: Rect, page_height_pt: f64, zoom: f64) -> Rect {
    Rect {
        x: rect.x * zoom,
        y: (page_height_pt - rect.y - rect.height) * zoom,
        width: rect.width * zoom,
        height: rect.height * zoom,
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn zoom() -> impl Strategy<Value = f64> {
        0.25f64..4.0
    }

    proptest! {
        /// Property: presentation -> page -> presentation stays within one point
        #[test]
        fn roundtrip_within_one_point(
            x in 0.0f64..1000.0,
            y in 0.0f64..1000.0,
            width in 1.0f64..500.0,
            height in 1.0f64..500.0,
            zoom in zoom(),
        ) {
            let rect = Rect::new(x, y, width, height);
            let back = to_presentation_space(to_page_space(rect, 842.0, zoom), 842.0, zoom);

            // One point of error is `zoom` pixels
            let tolerance = zoom + 1e-9;
            prop_assert!((back.x - rect.x).abs() <= tolerance, "x: {} vs {}", back.x, rect.x);
            prop_assert!((back.y - rect.y).abs() <= tolerance, "y: {} vs {}", back.y, rect.y);
            prop_assert!((back.width - rect.width).abs() <= tolerance);
            prop_assert!((back.height - rect.height).abs() <= tolerance);
        }

        /// Property: integral page-space rects survive page -> presentation -> page exactly
        #[test]
        fn page_roundtrip_is_exact(
            x in 0u32..600,
            y in 0u32..800,
            width in 1u32..300,
            height in 1u32..300,
            zoom in zoom(),
        ) {
            let page = Rect::new(x as f64, y as f64, width as f64, height as f64);
            let back = to_page_space(to_presentation_space(page, 842.0, zoom), 842.0, zoom);
            prop_assert_eq!(back, page);
        }

        /// Property: page-space outputs are always whole points
        #[test]
        fn page_space_is_integral(
            x in 0.0f64..1000.0,
            y in 0.0f64..1000.0,
            width in 0.0f64..500.0,
            height in 0.0f64..500.0,
            zoom in zoom(),
        ) {
            let page = to_page_space(Rect::new(x, y, width, height), 792.0, zoom);
            prop_assert_eq!(page.x.fract(), 0.0);
            prop_assert_eq!(page.y.fract(), 0.0);
            prop_assert_eq!(page.width.fract(), 0.0);
            prop_assert_eq!(page.height.fract(), 0.0);
        }
    }
}
