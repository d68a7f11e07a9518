use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;

use super::{ContentProvider, ContentRequest, Document};
use crate::error::ContentError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Chapter {
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub book_name: String,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

/// Textbooks indexed by class, then subject.
///
/// The JSON shape is `{ "<class>": { "<subject>": { "bookName": .., "chapters": [..] } } }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct CurriculumLibrary {
    classes: BTreeMap<String, BTreeMap<String, Book>>,
}

impl CurriculumLibrary {
    /// # Errors
    ///
    /// Returns `ContentError::Parse` if `json` is not a library table.
    pub fn from_json(json: &str) -> Result<Self, ContentError> {
        serde_json::from_str(json).map_err(|e| ContentError::Parse(e.to_string()))
    }

    pub fn insert(&mut self, class: impl Into<String>, subject: impl Into<String>, book: Book) {
        self.classes
            .entry(class.into())
            .or_default()
            .insert(subject.into(), book);
    }

    /// Subjects offered for `class`, alphabetically.
    #[must_use]
    pub fn subjects(&self, class: &str) -> Vec<&str> {
        self.classes
            .get(class.trim())
            .map(|subjects| subjects.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// The book for `(class, subject)` if it has at least one chapter.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::UnknownBook` otherwise.
    pub fn book(&self, class: &str, subject: &str) -> Result<&Book, ContentError> {
        self.classes
            .get(class.trim())
            .and_then(|subjects| subjects.get(subject.trim()))
            .filter(|book| !book.chapters.is_empty())
            .ok_or_else(|| ContentError::UnknownBook {
                class: class.trim().to_string(),
                subject: subject.trim().to_string(),
            })
    }
}

#[async_trait]
impl ContentProvider for CurriculumLibrary {
    async fn fetch(&self, request: &ContentRequest) -> Result<Document, ContentError> {
        let ContentRequest::Chapter {
            class,
            subject,
            title,
        } = request
        else {
            return Err(ContentError::Unsupported);
        };

        let book = self.book(class, subject)?;
        let chapter = book
            .chapters
            .iter()
            .find(|chapter| chapter.title == title.trim())
            .ok_or_else(|| ContentError::UnknownChapter {
                title: title.clone(),
            })?;

        Ok(Document::new(
            Some(chapter.title.clone()),
            chapter.content.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reading_core::model::Language;

    const LIBRARY: &str = r#"{
        "1": {
            "English": {
                "bookName": "Marigold",
                "chapters": [
                    { "title": "After a Bath", "content": "After my bath, I try, try, try to wipe myself till I am dry." },
                    { "title": "Coming Soon" }
                ]
            },
            "Science": { "bookName": "Looking Around", "chapters": [] }
        }
    }"#;

    fn chapter(subject: &str, title: &str) -> ContentRequest {
        ContentRequest::Chapter {
            class: "1".into(),
            subject: subject.into(),
            title: title.into(),
        }
    }

    #[tokio::test]
    async fn fetches_chapter_by_title() {
        let library = CurriculumLibrary::from_json(LIBRARY).unwrap();
        let doc = library.fetch(&chapter("English", "After a Bath")).await.unwrap();
        assert_eq!(doc.title.as_deref(), Some("After a Bath"));
        assert!(doc.readable_content().unwrap().starts_with("After my bath"));
    }

    #[tokio::test]
    async fn chapter_without_content_is_still_a_document() {
        let library = CurriculumLibrary::from_json(LIBRARY).unwrap();
        let doc = library.fetch(&chapter("English", "Coming Soon")).await.unwrap();
        assert!(doc.readable_content().is_none());
    }

    #[tokio::test]
    async fn empty_or_missing_books_are_unknown() {
        let library = CurriculumLibrary::from_json(LIBRARY).unwrap();
        let err = library.fetch(&chapter("Science", "Our Body")).await.unwrap_err();
        assert!(matches!(err, ContentError::UnknownBook { .. }));

        let err = library.fetch(&chapter("English", "Nope")).await.unwrap_err();
        assert!(matches!(err, ContentError::UnknownChapter { .. }));

        let story = ContentRequest::Story {
            class: "1".into(),
            language: Language::English,
        };
        assert!(matches!(
            library.fetch(&story).await.unwrap_err(),
            ContentError::Unsupported
        ));
    }

    #[test]
    fn lists_subjects_and_rejects_bad_json() {
        let library = CurriculumLibrary::from_json(LIBRARY).unwrap();
        assert_eq!(library.subjects("1"), vec!["English", "Science"]);
        assert!(library.subjects("9").is_empty());
        assert!(matches!(
            CurriculumLibrary::from_json("[1, 2]"),
            Err(ContentError::Parse(_))
        ));
    }
}
