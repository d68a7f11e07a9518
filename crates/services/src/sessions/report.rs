use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use reading_core::model::{Mistake, ReadingReport, ReportError, Segment, omissions_for};

use crate::analysis::MistakeAnalyzer;

/// Turns captured transcripts into a mistake report.
///
/// Every captured segment is analyzed concurrently. A failed analysis only
/// empties that segment's mistake list.
#[derive(Clone)]
pub struct ReportCompiler {
    analyzer: Arc<dyn MistakeAnalyzer>,
}

impl ReportCompiler {
    #[must_use]
    pub fn new(analyzer: Arc<dyn MistakeAnalyzer>) -> Self {
        Self { analyzer }
    }

    /// Analyze `transcripts` against `segments`.
    ///
    /// Segments without a transcript are listed as unattempted. A blank
    /// transcript counts every target word as omitted without calling the
    /// analyzer. Transcripts for indices outside `segments` are ignored.
    ///
    /// # Errors
    ///
    /// Returns `ReportError` if `completed_at` precedes `started_at`.
    pub async fn compile(
        &self,
        segments: &[Segment],
        transcripts: &BTreeMap<usize, String>,
        attempted_count: usize,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Result<ReadingReport, ReportError> {
        let analyses = transcripts.iter().filter_map(|(&index, spoken)| {
            let target = segments.get(index)?;
            Some(self.analyze_segment(index, spoken, target))
        });
        let mistakes: BTreeMap<usize, Vec<Mistake>> = join_all(analyses).await.into_iter().collect();

        let unattempted = (0..segments.len())
            .filter(|index| !mistakes.contains_key(index))
            .collect();

        tracing::info!(
            analyzed = mistakes.len(),
            segments = segments.len(),
            "reading report compiled"
        );
        ReadingReport::new(
            segments.len(),
            attempted_count,
            mistakes,
            unattempted,
            started_at,
            completed_at,
        )
    }

    async fn analyze_segment(&self, index: usize, spoken: &str, target: &Segment) -> (usize, Vec<Mistake>) {
        if spoken.trim().is_empty() {
            return (index, omissions_for(target.as_str()));
        }
        match self.analyzer.analyze(spoken, target.as_str()).await {
            Ok(mistakes) => (index, mistakes),
            Err(err) => {
                tracing::warn!(segment = index, error = %err, "mistake analysis failed");
                (index, Vec::new())
            }
        }
    }
}

impl std::fmt::Debug for ReportCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportCompiler").finish_non_exhaustive()
    }
}
