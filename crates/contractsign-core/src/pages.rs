//! Page specifiers for field placement
//!
//! A field can repeat on several pages of its document. The page specifier is a
//! small grammar: a single page (`"1"`), a comma list (`"1,3"`), an inclusive
//! range (`"1-3"`), or any mix of those (`"1-3, 5"`). It is parsed once into a
//! sorted set of 1-indexed page numbers.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FieldError;

/// Largest page number the parser will expand a range up to.
pub const MAX_PAGE_NUMBER: u32 = 100_000;

/// Upper bound on pages expanded across all parts of one specifier,
/// duplicates included.
pub const MAX_EXPANDED_PAGES: u64 = MAX_PAGE_NUMBER as u64;

/// A parsed page specifier. Keeps the text it was parsed from so it can be
/// persisted verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PageSpec {
    raw: String,
    pages: BTreeSet<u32>,
}

impl PageSpec {
    /// Parse a page specifier. Fails on malformed parts, page 0, reversed ranges,
    /// specs that expand past [`MAX_EXPANDED_PAGES`], and specs that select no
    /// page at all.
    pub fn parse(spec: &str) -> Result<Self, FieldError> {
        let raw = spec.trim();
        let invalid = |reason: String| FieldError::InvalidPageSpec {
            spec: spec.to_string(),
            reason,
        };

        let mut pages = BTreeSet::new();
        let mut expanded: u64 = 0;
        let mut charge = |count: u64| {
            expanded += count;
            if expanded > MAX_EXPANDED_PAGES {
                Err(format!("expands to more than {} pages", MAX_EXPANDED_PAGES))
            } else {
                Ok(())
            }
        };
        for part in raw.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            if let Some((start, end)) = part.split_once('-') {
                let start = parse_page_number(start.trim()).map_err(&invalid)?;
                let end = parse_page_number(end.trim()).map_err(&invalid)?;
                if start > end {
                    return Err(invalid(format!("range start {} > end {}", start, end)));
                }
                charge(u64::from(end - start) + 1).map_err(&invalid)?;
                pages.extend(start..=end);
            } else {
                let page = parse_page_number(part).map_err(&invalid)?;
                charge(1).map_err(&invalid)?;
                pages.insert(page);
            }
        }

        if pages.is_empty() {
            return Err(invalid("no pages selected".to_string()));
        }

        Ok(Self {
            raw: raw.to_string(),
            pages,
        })
    }

    /// A spec selecting exactly one page. Not validated here; page 0 is
    /// rejected by [`PageSpec::check_within`].
    pub fn single(page: u32) -> Self {
        Self {
            raw: page.to_string(),
            pages: BTreeSet::from([page]),
        }
    }

    /// The text this spec was parsed from (trimmed)
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Selected pages, sorted and deduplicated
    pub fn pages(&self) -> &BTreeSet<u32> {
        &self.pages
    }

    pub fn contains(&self, page: u32) -> bool {
        self.pages.contains(&page)
    }

    /// First selected page
    pub fn first(&self) -> u32 {
        // Construction guarantees at least one page
        self.pages.iter().next().copied().unwrap_or(1)
    }

    /// Last selected page
    pub fn last(&self) -> u32 {
        self.pages.iter().next_back().copied().unwrap_or(1)
    }

    /// Check every selected page exists in a document of `page_count` pages
    pub fn check_within(&self, page_count: u32) -> Result<(), FieldError> {
        let first = self.first();
        if first < 1 {
            return Err(FieldError::InvalidPageSpec {
                spec: self.raw.clone(),
                reason: format!("page number must be >= 1, got {}", first),
            });
        }
        let last = self.last();
        if last > page_count {
            return Err(FieldError::InvalidPageSpec {
                spec: self.raw.clone(),
                reason: format!("page {} exceeds total pages {}", last, page_count),
            });
        }
        Ok(())
    }
}

fn parse_page_number(s: &str) -> Result<u32, String> {
    let n = s
        .parse::<u32>()
        .map_err(|_| format!("invalid page number: {:?}", s))?;
    if n < 1 {
        return Err(format!("page number must be >= 1, got {}", n));
    }
    if n > MAX_PAGE_NUMBER {
        return Err(format!("page number {} exceeds {}", n, MAX_PAGE_NUMBER));
    }
    Ok(n)
}

impl FromStr for PageSpec {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PageSpec {
    type Error = FieldError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PageSpec> for String {
    fn from(spec: PageSpec) -> Self {
        spec.raw
    }
}

impl fmt::Display for PageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(spec: &str) -> Vec<u32> {
        PageSpec::parse(spec).unwrap().pages().iter().copied().collect()
    }

    #[test]
    fn test_single_page() {
        assert_eq!(pages("1"), vec![1]);
    }

    #[test]
    fn test_comma_list() {
        assert_eq!(pages("1,3"), vec![1, 3]);
    }

    #[test]
    fn test_inclusive_range() {
        assert_eq!(pages("1-3"), vec![1, 2, 3]);
    }

    #[test]
    fn test_mixed_with_whitespace() {
        assert_eq!(pages(" 1-3, 5 , 8 - 9 "), vec![1, 2, 3, 5, 8, 9]);
    }

    #[test]
    fn test_duplicates_collapse() {
        assert_eq!(pages("2,1-3,2"), vec![1, 2, 3]);
    }

    #[test]
    fn test_raw_is_kept_trimmed() {
        let spec = PageSpec::parse("  1-3 ").unwrap();
        assert_eq!(spec.as_str(), "1-3");
        assert_eq!(spec.to_string(), "1-3");
    }

    #[test]
    fn test_rejects_empty() {
        assert!(matches!(
            PageSpec::parse("   "),
            Err(FieldError::InvalidPageSpec { .. })
        ));
        assert!(PageSpec::parse(",,").is_err());
    }

    #[test]
    fn test_rejects_page_zero() {
        assert!(PageSpec::parse("0").is_err());
        assert!(PageSpec::parse("0-2").is_err());
    }

    #[test]
    fn test_rejects_reversed_range() {
        assert!(PageSpec::parse("3-1").is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(PageSpec::parse("abc").is_err());
        assert!(PageSpec::parse("1-2-3").is_err());
        assert!(PageSpec::parse("-2").is_err());
        assert!(PageSpec::parse("all").is_err());
    }

    #[test]
    fn test_rejects_huge_range() {
        assert!(PageSpec::parse("1-4000000000").is_err());
    }

    #[test]
    fn test_rejects_oversized_expansion() {
        let repeated = vec!["1-100000"; 2000].join(",");
        assert!(matches!(
            PageSpec::parse(&repeated),
            Err(FieldError::InvalidPageSpec { .. })
        ));
        assert!(PageSpec::parse("1-100000,1").is_err());
        assert_eq!(PageSpec::parse("1-100000").unwrap().pages().len(), 100_000);
    }

    #[test]
    fn test_check_within_rejects_single_page_zero() {
        let spec = PageSpec::single(0);
        assert!(matches!(
            spec.check_within(3),
            Err(FieldError::InvalidPageSpec { .. })
        ));
        assert!(PageSpec::single(1).check_within(3).is_ok());
    }

    #[test]
    fn test_check_within() {
        let spec = PageSpec::parse("1-3").unwrap();
        assert!(spec.check_within(3).is_ok());
        assert!(spec.check_within(10).is_ok());
        assert!(matches!(
            spec.check_within(2),
            Err(FieldError::InvalidPageSpec { .. })
        ));
    }

    #[test]
    fn test_first_and_last() {
        let spec = PageSpec::parse("4, 2-3, 9").unwrap();
        assert_eq!(spec.first(), 2);
        assert_eq!(spec.last(), 9);
        assert!(spec.contains(3));
        assert!(!spec.contains(5));
    }

    #[test]
    fn test_serde_as_string() {
        let spec = PageSpec::parse("1,3").unwrap();
        let json = serde_json::to_string(&spec).unwrap();
        assert_eq!(json, "\"1,3\"");

        let back: PageSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);

        assert!(serde_json::from_str::<PageSpec>("\"x\"").is_err());
    }
}
