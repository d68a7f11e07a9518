use async_trait::async_trait;
use reading_core::model::Language;

use super::ChatClient;
use crate::content::StoryGenerator;
use crate::error::GenerationError;

/// Prompt for a short, child-safe story at `grade` in `language`.
#[must_use]
pub fn story_prompt(grade: &str, language: Language) -> String {
    [
        "You are a creative and engaging storyteller for children.".to_string(),
        format!("Generate a short story for a Grade {} student.", grade.trim()),
        format!("The story must be in {}.", language.display_name()),
        "Use simple, age-appropriate words and complete sentences.".to_string(),
        "The tone must be clear, concrete, and child-safe.".to_string(),
        "Only return the story text. Do not add any titles, headings, or explanations."
            .to_string(),
    ]
    .join("\n")
}

#[derive(Debug, Clone)]
pub struct AiStoryGenerator {
    client: ChatClient,
}

impl AiStoryGenerator {
    #[must_use]
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StoryGenerator for AiStoryGenerator {
    async fn generate(&self, grade: &str, language: Language) -> Result<String, GenerationError> {
        let story = self
            .client
            .complete(None, &story_prompt(grade, language), 0.8)
            .await?;
        let story = story.trim();
        if story.is_empty() {
            return Err(GenerationError::Empty);
        }
        Ok(story.to_string())
    }
}
