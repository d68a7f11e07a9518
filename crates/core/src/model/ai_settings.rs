use thiserror::Error;
use url::Url;

pub const DEFAULT_AI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_AI_MODEL: &str = "gpt-4o-mini";

/// Validated settings for the chat-completion backend used by mistake
/// analysis and story generation.
#[derive(Clone, PartialEq, Eq)]
pub struct AiSettings {
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Clone, Debug, Default)]
pub struct AiSettingsDraft {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AiSettingsError {
    #[error("API key is missing")]
    MissingApiKey,
    #[error("invalid base URL")]
    InvalidBaseUrl,
}

impl AiSettingsDraft {
    /// Validate and normalize the draft, filling in default URL and model.
    ///
    /// # Errors
    ///
    /// Returns `AiSettingsError` if the key is missing or the base URL is invalid.
    pub fn validate(self) -> Result<AiSettings, AiSettingsError> {
        let api_key = normalize_optional(self.api_key).ok_or(AiSettingsError::MissingApiKey)?;
        let base_url = normalize_optional(self.base_url)
            .unwrap_or_else(|| DEFAULT_AI_BASE_URL.to_string());
        let model = normalize_optional(self.model).unwrap_or_else(|| DEFAULT_AI_MODEL.to_string());

        if Url::parse(&base_url).is_err() {
            return Err(AiSettingsError::InvalidBaseUrl);
        }

        Ok(AiSettings {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }
}

impl AiSettings {
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl std::fmt::Debug for AiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiSettings")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}
