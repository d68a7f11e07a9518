use async_trait::async_trait;
use reading_core::model::Mistake;

use crate::error::AnalysisError;

/// Compares what was said with what was written for one segment.
///
/// Implementations return mistakes in reading order. Callers never pass an
/// empty `spoken` text; that case is answered locally as all-omitted.
#[async_trait]
pub trait MistakeAnalyzer: Send + Sync {
    /// # Errors
    ///
    /// Returns `AnalysisError` when the comparison could not be made.
    async fn analyze(&self, spoken: &str, target: &str) -> Result<Vec<Mistake>, AnalysisError>;
}
