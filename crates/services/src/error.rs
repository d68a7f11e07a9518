//! Shared error types for the services crate.

use thiserror::Error;

use reading_core::model::ReportError;

use crate::sessions::SessionStep;

/// Errors from the chat-completion client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AiError {
    #[error("AI backend is not configured")]
    Disabled,
    #[error("AI backend returned an empty response")]
    EmptyResponse,
    #[error("AI request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors from a mistake-analysis call for one segment.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnalysisError {
    #[error(transparent)]
    Ai(#[from] AiError),
    #[error("analysis response is not a mistake list: {0}")]
    InvalidResponse(String),
    #[error("analysis failed: {0}")]
    Failed(String),
}

/// Errors from story generation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerationError {
    #[error(transparent)]
    Ai(#[from] AiError),
    #[error("generated story is empty")]
    Empty,
    #[error("story generation failed: {0}")]
    Failed(String),
}

/// Errors from content providers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContentError {
    #[error("no book for {subject} in grade {class}")]
    UnknownBook { class: String, subject: String },
    #[error("no chapter titled {title:?}")]
    UnknownChapter { title: String },
    #[error("this provider cannot serve the request")]
    Unsupported,
    #[error("invalid content table: {0}")]
    Parse(String),
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Errors raised by a platform speech recognizer when starting.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RecognitionError {
    #[error("recognition is already running")]
    AlreadyStarted,
    #[error("recognizer failed to start: {0}")]
    StartFailed(String),
}

/// Errors emitted by the reading engine.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("document has no content to read")]
    NoContent,
    #[error("operation requires the reading step, engine is in {0:?}")]
    NotReading(SessionStep),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error(transparent)]
    Content(#[from] ContentError),
}
