use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SegmentError {
    #[error("segment text must not be empty")]
    Empty,
}

/// One chunk of a document presented for reading.
///
/// Segments are immutable once built and never empty. Inner whitespace is
/// collapsed to single spaces.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment(String);

impl Segment {
    /// Build a segment from raw text, normalizing whitespace.
    ///
    /// # Errors
    ///
    /// Returns `SegmentError::Empty` if nothing but whitespace remains.
    pub fn parse(text: impl AsRef<str>) -> Result<Self, SegmentError> {
        let normalized = text.as_ref().split_whitespace().collect::<Vec<_>>().join(" ");
        if normalized.is_empty() {
            return Err(SegmentError::Empty);
        }
        Ok(Self(normalized))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whitespace-separated words exactly as written (punctuation kept).
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.0.split_whitespace()
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Segment({:?})", self.0)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Segment {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_collapses_whitespace() {
        let segment = Segment::parse("  The   cat\n sat. ").unwrap();
        assert_eq!(segment.as_str(), "The cat sat.");
        assert_eq!(segment.words().count(), 3);
    }

    #[test]
    fn parse_rejects_blank_text() {
        assert_eq!(Segment::parse(" \t\n").unwrap_err(), SegmentError::Empty);
    }
}
