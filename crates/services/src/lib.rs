#![forbid(unsafe_code)]

pub mod ai;
pub mod analysis;
pub mod content;
pub mod error;
pub mod progress_store;
pub mod sessions;
pub mod speech;

pub use reading_core::Clock;

pub use analysis::MistakeAnalyzer;
pub use content::{
    ContentProvider, ContentRequest, CurriculumLibrary, Document, StoryContentProvider,
    StoryGenerator,
};
pub use error::{
    AiError, AnalysisError, ContentError, GenerationError, RecognitionError, SessionError,
};
pub use progress_store::ProgressStore;
pub use sessions::{
    DocumentOutcome, ListenOutcome, NavOutcome, ReadingEngine, ReadingSession, ReportCompiler,
    SessionConfig, SessionStep, SpeechUpdate,
};
pub use speech::{
    PronunciationHelper, SpeechRecognizer, SpeechSessionAdapter, SpeechSynthesizer,
};
