use std::collections::{BTreeMap, BTreeSet};

use reading_core::model::Segment;
use reading_core::{WordMatch, match_words, segment_text};

use crate::error::SessionError;
use crate::speech::{RecognitionChunk, TranscriptBuffer};

/// How a recognition result moved the current segment along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultOutcome {
    /// Live count updated; segment not yet fully read.
    Progress(WordMatch),
    /// This result completed the segment. Reported once per attempt.
    Completed(WordMatch),
    /// Segment was already completed; only the transcript was refreshed.
    AlreadyProcessed,
}

/// Outcome of stepping forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Moved(usize),
    /// The current segment is the last one.
    AtEnd,
}

//
// ─── READING SESSION ───────────────────────────────────────────────────────────
//

/// In-memory state of one reading pass over one document.
///
/// Owns the segments, the cursor, which segments were attempted, and the
/// final transcripts captured so far. Has no I/O; the engine drives it.
#[derive(Debug, Clone)]
pub struct ReadingSession {
    segments: Vec<Segment>,
    current: usize,
    attempted: BTreeSet<usize>,
    transcripts: BTreeMap<usize, String>,
    buffer: TranscriptBuffer,
    live: WordMatch,
    processed: bool,
}

impl ReadingSession {
    /// Segment `text` and place the cursor at `start_index`.
    ///
    /// A stale `start_index` past the last segment falls back to 0.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoContent` if `text` has nothing to read.
    pub fn begin(text: &str, start_index: usize) -> Result<Self, SessionError> {
        let segments = segment_text(text);
        if segments.is_empty() {
            return Err(SessionError::NoContent);
        }
        let current = if start_index < segments.len() {
            start_index
        } else {
            0
        };

        let mut session = Self {
            segments,
            current,
            attempted: BTreeSet::new(),
            transcripts: BTreeMap::new(),
            buffer: TranscriptBuffer::new(),
            live: WordMatch::default(),
            processed: false,
        };
        session.reset_attempt();
        Ok(session)
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_segment(&self) -> &Segment {
        &self.segments[self.current]
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.current + 1 == self.segments.len()
    }

    /// Live word count for the current attempt.
    #[must_use]
    pub fn live_match(&self) -> WordMatch {
        self.live
    }

    #[must_use]
    pub fn is_processed(&self) -> bool {
        self.processed
    }

    #[must_use]
    pub fn attempted(&self) -> &BTreeSet<usize> {
        &self.attempted
    }

    #[must_use]
    pub fn was_attempted(&self, index: usize) -> bool {
        self.attempted.contains(&index)
    }

    /// Final transcripts stored on navigation so far.
    #[must_use]
    pub fn transcripts(&self) -> &BTreeMap<usize, String> {
        &self.transcripts
    }

    /// Everything heard in the current attempt.
    #[must_use]
    pub fn spoken_text(&self) -> String {
        self.buffer.spoken_text()
    }

    /// Record that listening started on the current segment and clear the
    /// per-attempt buffers. The segment stays attempted for good.
    pub fn mark_attempt(&mut self) {
        self.attempted.insert(self.current);
        self.reset_attempt();
    }

    /// Fold a recognizer result into the current attempt.
    pub fn apply_result(&mut self, result_index: usize, results: &[RecognitionChunk]) -> ResultOutcome {
        self.buffer.apply(result_index, results);
        if self.processed {
            return ResultOutcome::AlreadyProcessed;
        }

        self.live = match_words(&self.buffer.spoken_text(), self.current_segment().as_str());
        if self.live.is_complete() {
            self.processed = true;
            ResultOutcome::Completed(self.live)
        } else {
            ResultOutcome::Progress(self.live)
        }
    }

    /// Keep the current attempt's final text if the segment was attempted and
    /// something final was heard. An earlier capture is only replaced by a
    /// non-empty one.
    pub fn store_current_transcript(&mut self) {
        if !self.attempted.contains(&self.current) {
            return;
        }
        let final_text = self.buffer.final_text();
        if !final_text.is_empty() {
            self.transcripts.insert(self.current, final_text);
        }
    }

    /// Store the transcript and move to the next segment, if there is one.
    pub fn advance(&mut self) -> Step {
        self.store_current_transcript();
        if self.is_last() {
            return Step::AtEnd;
        }
        self.current += 1;
        self.reset_attempt();
        Step::Moved(self.current)
    }

    /// Store the transcript and move back one segment. `None` at the start,
    /// where nothing changes.
    pub fn retreat(&mut self) -> Option<usize> {
        if self.current == 0 {
            return None;
        }
        self.store_current_transcript();
        self.current -= 1;
        self.reset_attempt();
        Some(self.current)
    }

    /// Store the current transcript and hand back every capture, for compiling.
    pub fn captured_transcripts(&mut self) -> BTreeMap<usize, String> {
        self.store_current_transcript();
        self.transcripts.clone()
    }

    fn reset_attempt(&mut self) {
        self.buffer.clear();
        self.processed = false;
        self.live = WordMatch {
            matched: 0,
            target: match_words("", self.current_segment().as_str()).target,
        };
    }
}
