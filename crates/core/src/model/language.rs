use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported language: {0}")]
pub struct ParseLanguageError(pub String);

/// Reading language, which also picks the recognition locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Hindi,
}

impl Language {
    /// Short language code used for voice selection.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
        }
    }

    /// Locale handed to the speech recognizer.
    #[must_use]
    pub fn locale(self) -> &'static str {
        match self {
            Language::English => "en-IN",
            Language::Hindi => "hi-IN",
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "Hindi",
        }
    }

    /// Curriculum subjects are read in English except Hindi itself.
    #[must_use]
    pub fn for_subject(subject: &str) -> Self {
        if subject.trim().eq_ignore_ascii_case("hindi") {
            Language::Hindi
        } else {
            Language::English
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = ParseLanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "en-in" | "english" => Ok(Language::English),
            "hi" | "hi-in" | "hindi" => Ok(Language::Hindi),
            other => Err(ParseLanguageError(other.to_string())),
        }
    }
}

/// Presentation mode a reading engine is configured for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReadingMode {
    /// Chapters from the curriculum library for one subject.
    Curriculum { subject: String },
    /// Generated stories.
    Story,
}

impl ReadingMode {
    /// Subject-or-mode component of the progress key.
    #[must_use]
    pub fn scope_id(&self, language: Language) -> String {
        match self {
            ReadingMode::Curriculum { subject } => subject.trim().to_string(),
            ReadingMode::Story => format!("story-{}", language.code()),
        }
    }
}
