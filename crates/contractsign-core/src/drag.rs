//! Drag session for moving or resizing one field
//!
//! While a drag is active the field store is left alone: each pointer update
//! only recomputes a preview rectangle in presentation space. The store is
//! written once, on commit, with the preview converted back to page space.

use std::mem;

use crate::error::{FieldError, Result};
use crate::geometry::{Point, Rect, Viewport};
use crate::model::{Field, FieldId, Position, Size};
use crate::store::{FieldPatch, FieldStore};

/// Smallest preview a resize can shrink a field to, in presentation pixels
pub const MIN_DRAG_SIZE_PX: f64 = 10.0;

/// Smallest committed field size in page space. At high zoom the pixel
/// minimum can round down to zero points.
pub const MIN_FIELD_SIZE_PT: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    /// Translate the whole field
    Move,
    /// Drag the bottom-right handle; the top-left corner stays anchored
    Resize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveDrag {
    pub field_id: FieldId,
    pub mode: DragMode,
    pub viewport: Viewport,
    start: Point,
    anchor: Rect,
    preview: Rect,
}

impl ActiveDrag {
    /// Field rectangle in presentation space when the drag began
    pub fn anchor(&self) -> Rect {
        self.anchor
    }

    pub fn preview(&self) -> Rect {
        self.preview
    }
}

/// The store mutation a committed drag produced, for the caller to persist
#[derive(Debug, Clone, PartialEq)]
pub struct CommittedDrag {
    pub field_id: FieldId,
    pub mode: DragMode,
    pub patch: FieldPatch,
    /// Field as it was before the commit
    pub previous: Field,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragSession {
    #[default]
    Idle,
    Active(ActiveDrag),
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        matches!(self, DragSession::Active(_))
    }

    pub fn active(&self) -> Option<&ActiveDrag> {
        match self {
            DragSession::Active(drag) => Some(drag),
            DragSession::Idle => None,
        }
    }

    /// Current preview rectangle in presentation space
    pub fn preview(&self) -> Option<Rect> {
        self.active().map(|drag| drag.preview)
    }

    /// Start dragging `field_id`. Returns the field's presentation rectangle.
    pub fn begin(
        &mut self,
        store: &FieldStore,
        field_id: &FieldId,
        mode: DragMode,
        pointer: Point,
        viewport: Viewport,
    ) -> Result<Rect> {
        if let DragSession::Active(drag) = self {
            return Err(FieldError::SessionBusy(drag.field_id.clone()));
        }
        if !store.status().is_editable() {
            return Err(FieldError::ContractNotEditable(store.status()));
        }
        let field = store
            .get(field_id)
            .ok_or_else(|| FieldError::UnknownField(field_id.clone()))?;

        let anchor = viewport.to_presentation_space(field.rect());
        *self = DragSession::Active(ActiveDrag {
            field_id: field_id.clone(),
            mode,
            viewport,
            start: pointer,
            anchor,
            preview: anchor,
        });
        Ok(anchor)
    }

    /// Recompute the preview for a new pointer position
    pub fn update(&mut self, pointer: Point) -> Result<Rect> {
        let DragSession::Active(drag) = self else {
            return Err(FieldError::NoActiveSession);
        };

        let dx = pointer.x - drag.start.x;
        let dy = pointer.y - drag.start.y;
        drag.preview = match drag.mode {
            DragMode::Move => drag.anchor.translate(dx, dy),
            DragMode::Resize => Rect {
                width: (drag.anchor.width + dx).max(MIN_DRAG_SIZE_PX),
                height: (drag.anchor.height + dy).max(MIN_DRAG_SIZE_PX),
                ..drag.anchor
            },
        };
        Ok(drag.preview)
    }

    /// Write the preview into the store and end the session.
    ///
    /// Returns `None` when the preview maps back onto the stored geometry, in
    /// which case nothing was written.
    pub fn commit(&mut self, store: &mut FieldStore) -> Result<Option<CommittedDrag>> {
        let DragSession::Active(drag) = mem::take(self) else {
            return Err(FieldError::NoActiveSession);
        };

        let previous = store
            .get(&drag.field_id)
            .cloned()
            .ok_or_else(|| FieldError::UnknownField(drag.field_id.clone()))?;
        let page = drag.viewport.to_page_space(drag.preview);
        let size = Size::new(
            page.width.max(MIN_FIELD_SIZE_PT),
            page.height.max(MIN_FIELD_SIZE_PT),
        );
        // Keep the top edge where the preview put it
        let top = page.y + page.height;
        let position = Position::new(page.x, top - size.height);

        let patch = match drag.mode {
            DragMode::Move if position == previous.position => return Ok(None),
            DragMode::Move => FieldPatch::default().with_position(position),
            DragMode::Resize if position == previous.position && size == previous.size => {
                return Ok(None)
            }
            DragMode::Resize => FieldPatch::default()
                .with_position(position)
                .with_size(size),
        };

        store.update(&drag.field_id, patch.clone())?;
        tracing::debug!(field = %drag.field_id, mode = ?drag.mode, "drag committed");

        Ok(Some(CommittedDrag {
            field_id: drag.field_id,
            mode: drag.mode,
            patch,
            previous,
        }))
    }

    /// Drop the preview without touching the store
    pub fn cancel(&mut self) -> Option<FieldId> {
        match mem::take(self) {
            DragSession::Active(drag) => Some(drag.field_id),
            DragSession::Idle => None,
        }
    }
}
