use async_trait::async_trait;
use reading_core::model::Mistake;
use serde::Deserialize;

use super::ChatClient;
use crate::analysis::MistakeAnalyzer;
use crate::error::AnalysisError;

const SYSTEM_PROMPT: &str = "You compare a child's spoken reading with the target text. \
The spoken text comes from a speech-to-text service, so forgive small transcription slips \
that do not change a word.\n\
Rules:\n\
- Report mispronounced, omitted (skipped) and inserted (extra) words, in reading order.\n\
- For an omitted word, \"said\" is an empty string.\n\
- For an inserted word, \"expected\" is an empty string.\n\
- If there are no mistakes, return an empty array.\n\
- Reply with a single JSON array of objects with string fields \"said\" and \"expected\", and nothing else.";

/// Mistake analysis through a chat-completion model.
#[derive(Debug, Clone)]
pub struct AiMistakeAnalyzer {
    client: ChatClient,
}

impl AiMistakeAnalyzer {
    #[must_use]
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MistakeAnalyzer for AiMistakeAnalyzer {
    async fn analyze(&self, spoken: &str, target: &str) -> Result<Vec<Mistake>, AnalysisError> {
        let prompt = format!("Target Text: \"{target}\"\nSpoken Text: \"{spoken}\"");
        let reply = self.client.complete(Some(SYSTEM_PROMPT), &prompt, 0.0).await?;
        parse_mistakes(&reply)
    }
}

#[derive(Deserialize)]
struct RawMistake {
    #[serde(default)]
    said: String,
    #[serde(default)]
    expected: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawReply {
    List(Vec<RawMistake>),
    Wrapped { mistakes: Vec<RawMistake> },
}

/// Decode a model reply into mistakes.
///
/// Accepts a bare JSON array or `{"mistakes": [...]}`, optionally inside a
/// markdown code fence. Entries with both sides blank are dropped.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidResponse` if the reply is not such JSON.
pub fn parse_mistakes(reply: &str) -> Result<Vec<Mistake>, AnalysisError> {
    let json = strip_code_fence(reply);
    let raw: RawReply =
        serde_json::from_str(json).map_err(|e| AnalysisError::InvalidResponse(e.to_string()))?;
    let raw = match raw {
        RawReply::List(list) | RawReply::Wrapped { mistakes: list } => list,
    };
    Ok(raw
        .into_iter()
        .filter_map(|m| Mistake::new(m.said, m.expected).ok())
        .collect())
}

fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    let body = body.split_once('\n').map_or("", |(_, rest)| rest);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
