mod config;
mod engine;
mod machine;
mod report;

pub use config::{DEFAULT_GRACE_DELAY, SessionConfig};
pub use engine::{
    DocumentOutcome, ListenOutcome, NavOutcome, ReadingEngine, START_FAILED_MESSAGE, SpeechUpdate,
};
pub use machine::{ReadingSession, ResultOutcome, Step};
pub use report::ReportCompiler;

/// Where the reading engine is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionStep {
    /// Waiting for a document to be chosen.
    #[default]
    SelectingContent,
    /// Fetching or segmenting the document.
    Preparing,
    /// One segment is active.
    Reading,
    /// Transcripts are being analyzed.
    Compiling,
    /// The report is ready.
    Feedback,
    /// The document could not be loaded; `reset` goes back to selection.
    Failed(String),
}
