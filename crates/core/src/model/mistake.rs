use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MistakeError {
    #[error("a mistake needs a said or an expected word")]
    Empty,
}

/// How the spoken word differs from the expected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MistakeKind {
    /// Expected word was skipped.
    Omission,
    /// Extra word that is not in the text.
    Insertion,
    /// Word read differently than written.
    Substitution,
}

/// A `(said, expected)` discrepancy found by mistake analysis.
///
/// At most one side is empty; both-empty pairs are rejected at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Mistake {
    said: String,
    expected: String,
}

impl Mistake {
    /// Build a mistake, trimming both sides.
    ///
    /// # Errors
    ///
    /// Returns `MistakeError::Empty` when both sides are blank.
    pub fn new(said: impl Into<String>, expected: impl Into<String>) -> Result<Self, MistakeError> {
        let said = said.into().trim().to_string();
        let expected = expected.into().trim().to_string();
        if said.is_empty() && expected.is_empty() {
            return Err(MistakeError::Empty);
        }
        Ok(Self { said, expected })
    }

    /// Build an omission for an expected word.
    ///
    /// # Errors
    ///
    /// Returns `MistakeError::Empty` when `expected` is blank.
    pub fn omitted(expected: impl Into<String>) -> Result<Self, MistakeError> {
        Self::new(String::new(), expected)
    }

    #[must_use]
    pub fn said(&self) -> &str {
        &self.said
    }

    #[must_use]
    pub fn expected(&self) -> &str {
        &self.expected
    }

    #[must_use]
    pub fn kind(&self) -> MistakeKind {
        if self.said.is_empty() {
            MistakeKind::Omission
        } else if self.expected.is_empty() {
            MistakeKind::Insertion
        } else {
            MistakeKind::Substitution
        }
    }
}

/// Every word of `target` reported as omitted.
///
/// This is the report for a segment whose spoken transcript is empty.
#[must_use]
pub fn omissions_for(target: &str) -> Vec<Mistake> {
    target
        .split_whitespace()
        .filter_map(|word| Mistake::omitted(word).ok())
        .collect()
}
