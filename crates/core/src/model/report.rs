use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::Mistake;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ReportError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("segment index {index} is out of range for {count} segments")]
    IndexOutOfRange { index: usize, count: usize },
}

/// Overall outcome shown at the top of the feedback view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportVerdict {
    /// Listening was never started on any segment.
    NothingRead,
    /// Every segment was read and no mistakes were found.
    Perfect,
    GreatEffort,
}

/// Compiled result of one reading session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadingReport {
    mistakes: BTreeMap<usize, Vec<Mistake>>,
    unattempted: Vec<usize>,
    segment_count: usize,
    attempted_count: usize,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
}

impl ReadingReport {
    /// Assemble a report. Unattempted indices are sorted and deduplicated.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidTimeRange` if `completed_at` precedes `started_at`.
    /// Returns `ReportError::IndexOutOfRange` if any index is not a segment.
    pub fn new(
        segment_count: usize,
        attempted_count: usize,
        mistakes: BTreeMap<usize, Vec<Mistake>>,
        mut unattempted: Vec<usize>,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, ReportError> {
        if completed_at < started_at {
            return Err(ReportError::InvalidTimeRange);
        }
        let out_of_range = mistakes
            .keys()
            .chain(unattempted.iter())
            .find(|index| **index >= segment_count);
        if let Some(&index) = out_of_range {
            return Err(ReportError::IndexOutOfRange {
                index,
                count: segment_count,
            });
        }

        unattempted.sort_unstable();
        unattempted.dedup();

        Ok(Self {
            mistakes,
            unattempted,
            segment_count,
            attempted_count,
            started_at,
            completed_at,
        })
    }

    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segment_count
    }

    /// Number of segments where listening was started at least once.
    #[must_use]
    pub fn attempted_count(&self) -> usize {
        self.attempted_count
    }

    #[must_use]
    pub fn mistakes(&self) -> &BTreeMap<usize, Vec<Mistake>> {
        &self.mistakes
    }

    /// Mistakes for one segment, empty when none were reported.
    #[must_use]
    pub fn mistakes_for(&self, index: usize) -> &[Mistake] {
        self.mistakes.get(&index).map(Vec::as_slice).unwrap_or(&[])
    }

    #[must_use]
    pub fn unattempted(&self) -> &[usize] {
        &self.unattempted
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    /// Mistakes with at least one non-empty side, across all segments.
    #[must_use]
    pub fn relevant_mistake_count(&self) -> usize {
        self.mistakes
            .values()
            .flatten()
            .filter(|m| !m.said().is_empty() || !m.expected().is_empty())
            .count()
    }

    #[must_use]
    pub fn verdict(&self) -> ReportVerdict {
        if self.attempted_count == 0 && self.segment_count > 0 {
            ReportVerdict::NothingRead
        } else if self.relevant_mistake_count() == 0 && self.unattempted.is_empty() {
            ReportVerdict::Perfect
        } else {
            ReportVerdict::GreatEffort
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn report(
        segment_count: usize,
        attempted: usize,
        mistakes: BTreeMap<usize, Vec<Mistake>>,
        unattempted: Vec<usize>,
    ) -> ReadingReport {
        ReadingReport::new(
            segment_count,
            attempted,
            mistakes,
            unattempted,
            fixed_now(),
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn verdict_is_perfect_only_when_everything_was_read_cleanly() {
        let clean = BTreeMap::from([(0, Vec::new()), (1, Vec::new())]);
        assert_eq!(report(2, 2, clean, Vec::new()).verdict(), ReportVerdict::Perfect);

        let partial = BTreeMap::from([(0, Vec::new())]);
        assert_eq!(
            report(2, 1, partial, vec![1]).verdict(),
            ReportVerdict::GreatEffort
        );

        let with_mistake = BTreeMap::from([(0, vec![Mistake::new("bat", "cat").unwrap()])]);
        assert_eq!(
            report(1, 1, with_mistake, Vec::new()).verdict(),
            ReportVerdict::GreatEffort
        );
    }

    #[test]
    fn verdict_reports_nothing_read() {
        assert_eq!(
            report(2, 0, BTreeMap::new(), vec![1, 0]).verdict(),
            ReportVerdict::NothingRead
        );
    }

    #[test]
    fn unattempted_indices_are_sorted() {
        let report = report(4, 1, BTreeMap::new(), vec![3, 1, 2, 1]);
        assert_eq!(report.unattempted(), &[1, 2, 3]);
        assert!(report.mistakes_for(2).is_empty());
    }

    #[test]
    fn rejects_inverted_time_range_and_stray_indices() {
        let later = fixed_now() + chrono::Duration::seconds(1);
        let err = ReadingReport::new(1, 0, BTreeMap::new(), Vec::new(), later, fixed_now())
            .unwrap_err();
        assert_eq!(err, ReportError::InvalidTimeRange);

        let err = ReadingReport::new(1, 0, BTreeMap::new(), vec![5], fixed_now(), fixed_now())
            .unwrap_err();
        assert_eq!(err, ReportError::IndexOutOfRange { index: 5, count: 1 });
    }
}
