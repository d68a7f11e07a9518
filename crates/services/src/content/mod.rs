//! Sources of text to read: curriculum chapters and generated stories.

mod curriculum;
mod story;

use async_trait::async_trait;
use reading_core::model::Language;

use crate::error::{ContentError, GenerationError};

pub use curriculum::{Book, Chapter, CurriculumLibrary};
pub use story::StoryContentProvider;

/// What the reader picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentRequest {
    Chapter {
        class: String,
        subject: String,
        title: String,
    },
    Story {
        class: String,
        language: Language,
    },
}

/// A readable document. Missing content is a normal state; it just cannot
/// be read yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl Document {
    #[must_use]
    pub fn new(title: Option<String>, content: Option<String>) -> Self {
        Self { title, content }
    }

    /// Content, if it has anything besides whitespace.
    #[must_use]
    pub fn readable_content(&self) -> Option<&str> {
        self.content.as_deref().filter(|text| !text.trim().is_empty())
    }
}

#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// # Errors
    ///
    /// Returns `ContentError` if the request cannot be served.
    async fn fetch(&self, request: &ContentRequest) -> Result<Document, ContentError>;
}

/// Writes a fresh story for a grade and language.
#[async_trait]
pub trait StoryGenerator: Send + Sync {
    /// # Errors
    ///
    /// Returns `GenerationError` if no story could be produced.
    async fn generate(&self, grade: &str, language: Language) -> Result<String, GenerationError>;
}
