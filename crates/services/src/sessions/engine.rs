use std::sync::Arc;

use chrono::{DateTime, Utc};
use reading_core::model::{ProgressKey, ReadingReport};
use reading_core::{Clock, WordMatch};
use storage::repository::ProgressRepository;
use tokio::time::{Instant, sleep_until};

use super::{ReadingSession, ReportCompiler, ResultOutcome, SessionConfig, SessionStep, Step};
use crate::analysis::MistakeAnalyzer;
use crate::content::{ContentProvider, ContentRequest, Document};
use crate::error::{RecognitionError, SessionError};
use crate::progress_store::ProgressStore;
use crate::speech::{
    PronunciationHelper, SpeechEvent, SpeechRecognizer, SpeechSessionAdapter, SpeechSynthesizer,
    StartOutcome,
};

pub const START_FAILED_MESSAGE: &str = "Failed to start microphone.";

/// Result of choosing a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentOutcome {
    /// Reading began at the first segment.
    Started,
    /// Unfinished progress exists; call `resume` or `start_over`.
    ResumeAvailable { saved_index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenOutcome {
    Listening,
    AlreadyListening,
    /// No recognizer on this platform; manual navigation still works.
    Unavailable,
    /// The microphone did not start; see `message`.
    StartFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    Moved(usize),
    Stayed,
    /// The session was compiled and the report is ready.
    Finished,
}

/// What one call to [`ReadingEngine::next_update`] changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechUpdate {
    Started,
    Progress(WordMatch),
    /// The segment was fully read; it advances after the grace delay.
    Completed(WordMatch),
    Stopped,
    /// A recognition error worth showing. The session continues.
    Error(String),
    Ignored,
    /// The grace delay for this segment ran out. Call
    /// [`ReadingEngine::advance`] to move on.
    AdvanceDue(usize),
}

#[derive(Debug, Clone, Copy)]
struct PendingAdvance {
    segment: usize,
    deadline: Instant,
}

enum Wake {
    Event(Option<SpeechEvent>),
    Deadline,
}

/// Drives one reading session at a time for a configured mode.
///
/// All state changes happen on `&mut self` in response to a caller action,
/// a speech event, or the grace timer, so nothing here needs locking.
pub struct ReadingEngine {
    config: SessionConfig,
    clock: Clock,
    step: SessionStep,
    progress: ProgressStore,
    compiler: ReportCompiler,
    speech: SpeechSessionAdapter,
    pronunciation: PronunciationHelper,
    document: Option<Document>,
    progress_key: Option<ProgressKey>,
    session: Option<ReadingSession>,
    started_at: Option<DateTime<Utc>>,
    pending: Option<PendingAdvance>,
    message: Option<String>,
    report: Option<ReadingReport>,
}

impl ReadingEngine {
    /// Engine with no speech capabilities attached. Add them with
    /// [`with_recognizer`](Self::with_recognizer) and
    /// [`with_synthesizer`](Self::with_synthesizer).
    #[must_use]
    pub fn new(
        config: SessionConfig,
        progress: Arc<dyn ProgressRepository>,
        analyzer: Arc<dyn MistakeAnalyzer>,
    ) -> Self {
        let speech = SpeechSessionAdapter::new(None, config.language());
        Self {
            config,
            clock: Clock::default(),
            step: SessionStep::SelectingContent,
            progress: ProgressStore::new(progress),
            compiler: ReportCompiler::new(analyzer),
            speech,
            pronunciation: PronunciationHelper::default(),
            document: None,
            progress_key: None,
            session: None,
            started_at: None,
            pending: None,
            message: None,
            report: None,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self.progress = self.progress.with_clock(clock);
        self
    }

    #[must_use]
    pub fn with_recognizer(mut self, recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        self.speech = SpeechSessionAdapter::new(Some(recognizer), self.config.language());
        self
    }

    #[must_use]
    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        self.pronunciation = PronunciationHelper::new(Some(synthesizer));
        self
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn step(&self) -> &SessionStep {
        &self.step
    }

    #[must_use]
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    #[must_use]
    pub fn progress_key(&self) -> Option<&ProgressKey> {
        self.progress_key.as_ref()
    }

    #[must_use]
    pub fn session(&self) -> Option<&ReadingSession> {
        self.session.as_ref()
    }

    /// The compiled report once the engine reaches `Feedback`.
    #[must_use]
    pub fn report(&self) -> Option<&ReadingReport> {
        self.report.as_ref()
    }

    /// Latest user-visible recognition message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Hand out the current message once.
    pub fn take_message(&mut self) -> Option<String> {
        self.message.take()
    }

    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.speech.is_active()
    }

    #[must_use]
    pub fn has_pending_advance(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub fn live_match(&self) -> Option<WordMatch> {
        self.session.as_ref().map(ReadingSession::live_match)
    }

    //
    // ─── CONTENT ───────────────────────────────────────────────────────────────
    //

    /// Ask `provider` for a document and load it.
    ///
    /// A provider failure moves the engine to `Failed`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Content` if the provider fails and
    /// `SessionError::NoContent` if the document has nothing to read.
    pub async fn fetch_document(
        &mut self,
        provider: &dyn ContentProvider,
        request: &ContentRequest,
    ) -> Result<DocumentOutcome, SessionError> {
        self.discard_session();
        self.step = SessionStep::Preparing;
        match provider.fetch(request).await {
            Ok(document) => self.load_document(document).await,
            Err(err) => {
                tracing::warn!(error = %err, "content could not be loaded");
                self.fail(err.to_string());
                Err(err.into())
            }
        }
    }

    /// Select `document` for reading, replacing any current session.
    ///
    /// Starts at the first segment unless unfinished progress is stored.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoContent` if the document has no content;
    /// the engine stays in `SelectingContent`.
    pub async fn load_document(&mut self, document: Document) -> Result<DocumentOutcome, SessionError> {
        self.discard_session();
        if document.readable_content().is_none() {
            self.step = SessionStep::SelectingContent;
            return Err(SessionError::NoContent);
        }

        self.progress_key = self.config.progress_key(document.title.as_deref());
        self.document = Some(document);

        match self.saved_progress().await {
            Some(saved_index) => {
                self.step = SessionStep::SelectingContent;
                Ok(DocumentOutcome::ResumeAvailable { saved_index })
            }
            None => {
                self.begin_session(0).await?;
                Ok(DocumentOutcome::Started)
            }
        }
    }

    /// Stored segment index for the selected document.
    pub async fn saved_progress(&self) -> Option<usize> {
        match self.progress_key.as_ref() {
            Some(key) => self.progress.load(key).await,
            None => None,
        }
    }

    //
    // ─── SESSION LIFECYCLE ─────────────────────────────────────────────────────
    //

    /// Segment the selected document and start reading at `start_index`.
    ///
    /// An index past the end starts at 0.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoContent` if no readable document is selected.
    pub async fn begin_session(&mut self, start_index: usize) -> Result<(), SessionError> {
        let text = self
            .document
            .as_ref()
            .and_then(Document::readable_content)
            .map(str::to_string)
            .ok_or(SessionError::NoContent)?;

        self.discard_session();
        self.step = SessionStep::Preparing;
        let session = match ReadingSession::begin(&text, start_index) {
            Ok(session) => session,
            Err(err) => {
                self.step = SessionStep::SelectingContent;
                return Err(err);
            }
        };

        let index = session.current_index();
        tracing::info!(
            segments = session.segment_count(),
            start = index,
            language = %self.config.language(),
            "reading session started"
        );
        self.session = Some(session);
        self.started_at = Some(self.clock.now());
        self.step = SessionStep::Reading;
        self.persist(index).await;
        Ok(())
    }

    /// Continue the selected document from its stored index.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoContent` if no readable document is selected.
    pub async fn resume(&mut self) -> Result<(), SessionError> {
        let start = self.saved_progress().await.unwrap_or(0);
        self.begin_session(start).await
    }

    /// Forget stored progress and read the selected document from the top.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoContent` if no readable document is selected.
    pub async fn start_over(&mut self) -> Result<(), SessionError> {
        if let Some(key) = self.progress_key.as_ref() {
            self.progress.remove(key).await;
        }
        self.begin_session(0).await
    }

    /// Leave the current document and go back to selection.
    pub fn reset(&mut self) {
        self.discard_session();
        self.pronunciation.stop();
        self.document = None;
        self.progress_key = None;
        self.step = SessionStep::SelectingContent;
    }

    /// Abandon the session and show `message` as a terminal error.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.discard_session();
        self.step = SessionStep::Failed(message.into());
    }

    //
    // ─── LISTENING ─────────────────────────────────────────────────────────────
    //

    /// Start recognition on the current segment and mark it attempted.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotReading` outside the reading step.
    pub fn start_listening(&mut self) -> Result<ListenOutcome, SessionError> {
        self.ensure_reading()?;
        if self.speech.is_active() {
            return Ok(ListenOutcome::AlreadyListening);
        }
        if !self.speech.is_available() {
            if let Some(notice) = self.speech.take_unavailable_notice() {
                self.message = Some(notice.to_string());
            }
            return Ok(ListenOutcome::Unavailable);
        }

        self.session_mut()?.mark_attempt();
        self.pending = None;
        self.message = None;

        match self.speech.start() {
            Ok(StartOutcome::Started) => Ok(ListenOutcome::Listening),
            Ok(StartOutcome::AlreadyActive) | Err(RecognitionError::AlreadyStarted) => {
                Ok(ListenOutcome::AlreadyListening)
            }
            Ok(StartOutcome::Unavailable) => Ok(ListenOutcome::Unavailable),
            Err(err) => {
                tracing::warn!(error = %err, "could not start recognition");
                self.message = Some(START_FAILED_MESSAGE.to_string());
                Ok(ListenOutcome::StartFailed)
            }
        }
    }

    /// Wait for the next speech event or the grace timer and apply it.
    ///
    /// Returns `None` when nothing can happen anymore: no recognizer and no
    /// pending advance. With a recognizer attached this waits until the next
    /// event arrives.
    ///
    /// Cancel safe: the only awaits are the event channel and the timer, and
    /// state changes are applied after they complete, so it can be raced
    /// against other input in `select!`. An expired grace delay is reported
    /// as [`SpeechUpdate::AdvanceDue`]; the move itself happens in
    /// [`advance`](Self::advance), which must be awaited to completion.
    pub async fn next_update(&mut self) -> Option<SpeechUpdate> {
        let deadline = self.pending.map(|pending| pending.deadline);
        if deadline.is_none() && !self.speech.is_available() {
            return None;
        }

        let wake = tokio::select! {
            event = self.speech.next_event() => Wake::Event(event),
            () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => Wake::Deadline,
        };

        match wake {
            Wake::Event(Some(event)) => Some(self.handle_speech_event(event)),
            Wake::Event(None) => None,
            Wake::Deadline => Some(self.take_due_advance()),
        }
    }

    /// Apply one recognizer event.
    pub fn handle_speech_event(&mut self, event: SpeechEvent) -> SpeechUpdate {
        match event {
            SpeechEvent::Start => SpeechUpdate::Started,
            SpeechEvent::End => SpeechUpdate::Stopped,
            SpeechEvent::Error(code) if code.is_silent() => SpeechUpdate::Stopped,
            SpeechEvent::Error(code) => {
                let message = format!("Mic error: {code}");
                tracing::warn!(code = %code, "recognition error");
                self.message = Some(message.clone());
                SpeechUpdate::Error(message)
            }
            SpeechEvent::Result {
                result_index,
                results,
            } => {
                if self.step != SessionStep::Reading {
                    return SpeechUpdate::Ignored;
                }
                let Some(session) = self.session.as_mut() else {
                    return SpeechUpdate::Ignored;
                };
                match session.apply_result(result_index, &results) {
                    ResultOutcome::Progress(live) => SpeechUpdate::Progress(live),
                    ResultOutcome::AlreadyProcessed => SpeechUpdate::Ignored,
                    ResultOutcome::Completed(live) => {
                        let segment = session.current_index();
                        self.speech.stop();
                        self.pending = Some(PendingAdvance {
                            segment,
                            deadline: Instant::now() + self.config.grace_delay(),
                        });
                        tracing::debug!(segment, matched = live.matched, "segment read");
                        SpeechUpdate::Completed(live)
                    }
                }
            }
        }
    }

    fn take_due_advance(&mut self) -> SpeechUpdate {
        let Some(pending) = self.pending.take() else {
            return SpeechUpdate::Ignored;
        };
        let still_there = self.step == SessionStep::Reading
            && self
                .session
                .as_ref()
                .is_some_and(|s| s.current_index() == pending.segment && s.is_processed());
        if still_there {
            SpeechUpdate::AdvanceDue(pending.segment)
        } else {
            SpeechUpdate::Ignored
        }
    }

    //
    // ─── NAVIGATION ────────────────────────────────────────────────────────────
    //

    /// Move to the next segment, or finish after the last one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotReading` outside the reading step, or a
    /// report error from finishing.
    pub async fn advance(&mut self) -> Result<NavOutcome, SessionError> {
        self.ensure_reading()?;
        self.pending = None;
        self.speech.abort();

        match self.session_mut()?.advance() {
            Step::Moved(index) => {
                tracing::debug!(segment = index, "advanced");
                self.persist(index).await;
                Ok(NavOutcome::Moved(index))
            }
            Step::AtEnd => {
                self.finish().await?;
                Ok(NavOutcome::Finished)
            }
        }
    }

    /// Move back one segment. Does nothing at all on the first segment.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotReading` outside the reading step.
    pub async fn retreat(&mut self) -> Result<NavOutcome, SessionError> {
        self.ensure_reading()?;
        if self.session_mut()?.current_index() == 0 {
            return Ok(NavOutcome::Stayed);
        }
        self.pending = None;
        self.speech.abort();

        match self.session_mut()?.retreat() {
            Some(index) => {
                tracing::debug!(segment = index, "went back");
                self.persist(index).await;
                Ok(NavOutcome::Moved(index))
            }
            None => Ok(NavOutcome::Stayed),
        }
    }

    /// Stop reading now and compile what was read so far.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotReading` outside the reading step.
    pub async fn end_early(&mut self) -> Result<(), SessionError> {
        self.ensure_reading()?;
        tracing::info!("session ended early");
        self.finish().await
    }

    /// Compile the report and clear stored progress.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotReading` outside the reading step and
    /// `SessionError::Report` if the report cannot be built, which also moves
    /// the engine to `Failed`.
    pub async fn finish(&mut self) -> Result<(), SessionError> {
        self.ensure_reading()?;
        self.pending = None;
        self.speech.abort();

        let session = self.session_mut()?;
        let transcripts = session.captured_transcripts();
        let attempted = session.attempted().len();
        self.step = SessionStep::Compiling;

        let now = self.clock.now();
        let started_at = self.started_at.unwrap_or(now);
        // The wall clock may have stepped backwards since the session began.
        let completed_at = now.max(started_at);
        let segments = self
            .session
            .as_ref()
            .map(|s| s.segments().to_vec())
            .unwrap_or_default();
        let compiled = self
            .compiler
            .compile(&segments, &transcripts, attempted, started_at, completed_at)
            .await;

        match compiled {
            Ok(report) => {
                if let Some(key) = self.progress_key.as_ref() {
                    self.progress.remove(key).await;
                }
                tracing::info!(
                    verdict = ?report.verdict(),
                    mistakes = report.relevant_mistake_count(),
                    unattempted = report.unattempted().len(),
                    "reading session finished"
                );
                self.report = Some(report);
                self.step = SessionStep::Feedback;
                Ok(())
            }
            Err(err) => {
                self.fail(err.to_string());
                Err(err.into())
            }
        }
    }

    /// Replay `word` in the session language. `false` if nothing was spoken.
    pub fn pronounce(&self, word: &str) -> bool {
        self.pronunciation.speak(word, self.config.language())
    }

    //
    // ─── INTERNALS ─────────────────────────────────────────────────────────────
    //

    fn ensure_reading(&self) -> Result<(), SessionError> {
        if self.step == SessionStep::Reading {
            Ok(())
        } else {
            Err(SessionError::NotReading(self.step.clone()))
        }
    }

    fn session_mut(&mut self) -> Result<&mut ReadingSession, SessionError> {
        let step = self.step.clone();
        self.session.as_mut().ok_or(SessionError::NotReading(step))
    }

    async fn persist(&self, index: usize) {
        if let Some(key) = self.progress_key.as_ref() {
            self.progress.save(key, index).await;
        }
    }

    fn discard_session(&mut self) {
        self.speech.abort();
        self.pending = None;
        self.session = None;
        self.started_at = None;
        self.report = None;
        self.message = None;
    }
}

impl std::fmt::Debug for ReadingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadingEngine")
            .field("config", &self.config)
            .field("step", &self.step)
            .field("progress_key", &self.progress_key)
            .field("speech", &self.speech)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::StoryContentProvider;
    use crate::content::StoryGenerator;
    use crate::error::{AnalysisError, GenerationError};
    use async_trait::async_trait;
    use reading_core::model::{Language, Mistake};
    use storage::repository::InMemoryRepository;

    struct NoMistakes;

    #[async_trait]
    impl MistakeAnalyzer for NoMistakes {
        async fn analyze(&self, _spoken: &str, _target: &str) -> Result<Vec<Mistake>, AnalysisError> {
            Ok(Vec::new())
        }
    }

    struct BrokenGenerator;

    #[async_trait]
    impl StoryGenerator for BrokenGenerator {
        async fn generate(&self, _grade: &str, _language: Language) -> Result<String, GenerationError> {
            Err(GenerationError::Failed("quota exceeded".into()))
        }
    }

    fn engine(config: SessionConfig) -> ReadingEngine {
        ReadingEngine::new(config, Arc::new(InMemoryRepository::new()), Arc::new(NoMistakes))
    }

    fn chapter(title: &str, content: &str) -> Document {
        Document::new(Some(title.into()), Some(content.into()))
    }

    #[tokio::test]
    async fn reading_works_without_recognition() {
        let mut engine = engine(SessionConfig::curriculum(Some("1".into()), "English"));
        engine
            .load_document(chapter("Rain", "Rain falls. Frogs sing."))
            .await
            .unwrap();

        assert_eq!(engine.start_listening().unwrap(), ListenOutcome::Unavailable);
        assert_eq!(
            engine.take_message().as_deref(),
            Some("Speech recognition is not supported on this device.")
        );
        assert_eq!(engine.message(), None);
        assert_eq!(engine.start_listening().unwrap(), ListenOutcome::Unavailable);
        assert_eq!(engine.message(), None);
        assert!(engine.session().unwrap().attempted().is_empty());
        assert!(engine.next_update().await.is_none());

        assert_eq!(engine.advance().await.unwrap(), NavOutcome::Finished);
        assert_eq!(engine.step(), &SessionStep::Feedback);
        assert_eq!(
            engine.report().unwrap().verdict(),
            reading_core::model::ReportVerdict::NothingRead
        );
    }

    #[tokio::test]
    async fn document_without_content_is_refused() {
        let mut engine = engine(SessionConfig::curriculum(Some("1".into()), "English"));
        let err = engine
            .load_document(Document::new(Some("Soon".into()), None))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NoContent));
        assert_eq!(engine.step(), &SessionStep::SelectingContent);
        assert!(matches!(
            engine.start_listening(),
            Err(SessionError::NotReading(SessionStep::SelectingContent))
        ));
    }

    #[tokio::test]
    async fn generation_failure_is_a_distinct_step_and_reset_recovers() {
        let mut engine = engine(SessionConfig::story(Some("2".into()), Language::English));
        let provider = StoryContentProvider::new(Arc::new(BrokenGenerator));
        let request = ContentRequest::Story {
            class: "2".into(),
            language: Language::English,
        };

        let err = engine.fetch_document(&provider, &request).await.unwrap_err();
        assert!(matches!(err, SessionError::Content(_)));
        assert!(matches!(engine.step(), SessionStep::Failed(msg) if msg.contains("quota exceeded")));

        engine.reset();
        assert_eq!(engine.step(), &SessionStep::SelectingContent);
        assert!(engine.document().is_none());
    }

    #[tokio::test]
    async fn navigation_outside_reading_is_rejected() {
        let mut engine = engine(SessionConfig::story(None, Language::Hindi));
        assert!(engine.advance().await.is_err());
        assert!(engine.retreat().await.is_err());
        assert!(engine.end_early().await.is_err());
        assert!(!engine.pronounce("घर"));
    }

    #[tokio::test]
    async fn clock_stepping_back_still_produces_a_report() {
        let repo = Arc::new(InMemoryRepository::new());
        let config = SessionConfig::curriculum(Some("1".into()), "English");
        let key = config.progress_key(Some("Rain")).unwrap();
        let started = reading_core::time::fixed_now();
        let mut engine = ReadingEngine::new(config, repo.clone(), Arc::new(NoMistakes))
            .with_clock(Clock::fixed(started));
        engine
            .load_document(chapter("Rain", "Rain falls. Frogs sing."))
            .await
            .unwrap();
        assert_eq!(repo.len(), 1);

        let mut engine = engine.with_clock(Clock::fixed(started - chrono::Duration::seconds(1)));
        engine.end_early().await.unwrap();

        assert_eq!(engine.step(), &SessionStep::Feedback);
        let report = engine.report().unwrap();
        assert_eq!(report.started_at(), started);
        assert_eq!(report.completed_at(), started);
        assert!(repo.is_empty());
    }
}
