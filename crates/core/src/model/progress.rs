use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const KEY_PREFIX: &str = "reading-progress";

/// Storage key for one in-progress document.
///
/// Derived from `(class, scope, title)`, where scope is the subject name or
/// the story mode identifier.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProgressKey(String);

impl ProgressKey {
    /// Returns `None` when the class or the title is missing or blank.
    #[must_use]
    pub fn derive(class: Option<&str>, scope: &str, title: Option<&str>) -> Option<Self> {
        let class = class.map(str::trim).filter(|c| !c.is_empty())?;
        let title = title.map(str::trim).filter(|t| !t.is_empty())?;
        Some(Self(format!("{KEY_PREFIX}-{class}-{}-{title}", scope.trim())))
    }

    /// Rehydrate a key read back from storage.
    #[must_use]
    pub fn from_persisted(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ProgressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProgressKey({})", self.0)
    }
}

impl fmt::Display for ProgressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Last active segment of a document that has not been finished yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRecord {
    key: ProgressKey,
    segment_index: usize,
    updated_at: DateTime<Utc>,
}

impl ProgressRecord {
    #[must_use]
    pub fn new(key: ProgressKey, segment_index: usize, updated_at: DateTime<Utc>) -> Self {
        Self {
            key,
            segment_index,
            updated_at,
        }
    }

    #[must_use]
    pub fn key(&self) -> &ProgressKey {
        &self.key
    }

    #[must_use]
    pub fn segment_index(&self) -> usize {
        self.segment_index
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
