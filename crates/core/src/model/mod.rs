mod ai_settings;
mod language;
mod mistake;
mod progress;
mod report;
mod segment;

pub use ai_settings::{
    AiSettings, AiSettingsDraft, AiSettingsError, DEFAULT_AI_BASE_URL, DEFAULT_AI_MODEL,
};
pub use language::{Language, ParseLanguageError, ReadingMode};
pub use mistake::{Mistake, MistakeError, MistakeKind, omissions_for};
pub use progress::{ProgressKey, ProgressRecord};
pub use report::{ReadingReport, ReportError, ReportVerdict};
pub use segment::{Segment, SegmentError};
