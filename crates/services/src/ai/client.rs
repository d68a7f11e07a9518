use std::env;

use reading_core::model::{AiSettings, AiSettingsDraft};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::AiError;

pub const API_KEY_VAR: &str = "READING_AI_API_KEY";
pub const BASE_URL_VAR: &str = "READING_AI_BASE_URL";
pub const MODEL_VAR: &str = "READING_AI_MODEL";

/// AI settings from the process environment; `None` disables AI features.
#[must_use]
pub fn settings_from_env() -> Option<AiSettings> {
    settings_from_vars(|name| env::var(name).ok())
}

/// AI settings from an arbitrary variable lookup.
///
/// A missing key disables AI quietly; an invalid base URL is logged.
#[must_use]
pub fn settings_from_vars(lookup: impl Fn(&str) -> Option<String>) -> Option<AiSettings> {
    let draft = AiSettingsDraft {
        api_key: lookup(API_KEY_VAR),
        base_url: lookup(BASE_URL_VAR),
        model: lookup(MODEL_VAR),
    };
    match draft.validate() {
        Ok(settings) => Some(settings),
        Err(err) => {
            if lookup(API_KEY_VAR).is_some_and(|key| !key.trim().is_empty()) {
                tracing::warn!(error = %err, "ignoring AI settings");
            }
            None
        }
    }
}

/// Minimal OpenAI-compatible chat-completions client.
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    settings: Option<AiSettings>,
}

impl ChatClient {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(settings_from_env())
    }

    #[must_use]
    pub fn new(settings: Option<AiSettings>) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.settings.is_some()
    }

    /// Send one system + user exchange and return the trimmed reply.
    ///
    /// # Errors
    ///
    /// Returns `AiError` when the client is disabled, the request fails,
    /// or the reply is empty.
    pub async fn complete(
        &self,
        system: Option<&str>,
        prompt: &str,
        temperature: f32,
    ) -> Result<String, AiError> {
        let settings = self.settings.as_ref().ok_or(AiError::Disabled)?;

        let url = format!("{}/chat/completions", settings.base_url());
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage {
                role: "system",
                content: system.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt.to_string(),
        });
        let payload = ChatRequest {
            model: settings.model().to_string(),
            messages,
            temperature,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(settings.api_key())
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AiError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(AiError::EmptyResponse)?;

        Ok(content)
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}
