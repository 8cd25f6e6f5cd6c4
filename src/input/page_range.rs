//! Page range specifications (`""`, `"N"`, `"N-M"`).

use std::fmt;
use std::str::FromStr;

use super::error::InputError;

/// Inclusive range of listing pages to walk.
///
/// `max == None` means "up to the creator's last page".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    min: u32,
    max: Option<u32>,
}

impl Default for PageRange {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl PageRange {
    /// Every page from the first to the last.
    #[must_use]
    pub fn unbounded() -> Self {
        Self { min: 1, max: None }
    }

    /// Parses a page specification.
    ///
    /// Accepts an empty string (unbounded), a single page `"N"`, or `"N-M"`
    /// in either order. Page numbers start at 1 and are written without
    /// leading zeros or surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::InvalidPageRange`] on non-digit tokens (spaces
    /// included), zero, leading zeros, or values that overflow `u32`.
    ///
    /// # Examples
    ///
    /// ```
    /// use harvester_core::input::PageRange;
    ///
    /// let range = PageRange::parse("5-2").unwrap();
    /// assert_eq!(range.min(), 2);
    /// assert_eq!(range.max(), Some(5));
    /// assert!(PageRange::parse("0-5").is_err());
    /// ```
    pub fn parse(spec: &str) -> Result<Self, InputError> {
        if spec.is_empty() {
            return Ok(Self::unbounded());
        }

        let (first, second) = match spec.split_once('-') {
            Some((first, second)) => (first, Some(second)),
            None => (spec, None),
        };

        let first = parse_page(spec, first)?;
        let Some(second) = second else {
            return Ok(Self {
                min: first,
                max: Some(first),
            });
        };
        let second = parse_page(spec, second)?;

        Ok(Self {
            min: first.min(second),
            max: Some(first.max(second)),
        })
    }

    /// First page to fetch (1-based).
    #[must_use]
    pub fn min(&self) -> u32 {
        self.min
    }

    /// Last page to fetch, or `None` when unbounded.
    #[must_use]
    pub fn max(&self) -> Option<u32> {
        self.max
    }

    /// Returns true when an upper bound was given.
    #[must_use]
    pub fn is_bounded(&self) -> bool {
        self.max.is_some()
    }

    /// Returns true if `page` falls inside the range.
    #[must_use]
    pub fn contains(&self, page: u32) -> bool {
        page >= self.min && self.max.is_none_or(|max| page <= max)
    }
}

fn parse_page(spec: &str, token: &str) -> Result<u32, InputError> {
    if token.is_empty() {
        return Err(InputError::page_range(spec, "missing page number"));
    }
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(InputError::page_range(
            spec,
            &format!("'{token}' is not a page number"),
        ));
    }
    let value: u32 = token
        .parse()
        .map_err(|_| InputError::page_range(spec, &format!("'{token}' is too large")))?;
    if value == 0 {
        return Err(InputError::page_range(spec, "page numbers start at 1"));
    }
    if token.starts_with('0') {
        return Err(InputError::page_range(
            spec,
            &format!("'{token}' has a leading zero"),
        ));
    }
    Ok(value)
}

impl FromStr for PageRange {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "{max}"),
            Some(max) => write!(f, "{}-{max}", self.min),
            None => write!(f, "{}-last", self.min),
        }
    }
}
