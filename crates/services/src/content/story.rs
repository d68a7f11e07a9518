use std::sync::Arc;

use async_trait::async_trait;

use super::{ContentProvider, ContentRequest, Document, StoryGenerator};
use crate::error::{ContentError, GenerationError};

/// Serves freshly generated stories. They have no title, so reading
/// progress is never kept for them.
#[derive(Clone)]
pub struct StoryContentProvider {
    generator: Arc<dyn StoryGenerator>,
}

impl StoryContentProvider {
    #[must_use]
    pub fn new(generator: Arc<dyn StoryGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl ContentProvider for StoryContentProvider {
    async fn fetch(&self, request: &ContentRequest) -> Result<Document, ContentError> {
        let ContentRequest::Story { class, language } = request else {
            return Err(ContentError::Unsupported);
        };

        let story = self.generator.generate(class, *language).await?;
        let story = story.trim();
        if story.is_empty() {
            return Err(GenerationError::Empty.into());
        }
        tracing::info!(class = %class, language = %language, "story generated");
        Ok(Document::new(None, Some(story.to_string())))
    }
}
