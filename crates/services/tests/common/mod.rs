#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reading_core::model::{Mistake, ProgressKey, ProgressRecord};
use reading_core::time::fixed_clock;
use services::error::{AnalysisError, RecognitionError};
use services::speech::{EventSink, RecognitionChunk, SpeechEvent, Utterance, Voice};
use services::{
    MistakeAnalyzer, ReadingEngine, SessionConfig, SpeechRecognizer, SpeechSynthesizer,
};
use storage::repository::{InMemoryRepository, ProgressRepository, StorageError};
use tokio::sync::Barrier;

pub const STORY: &str = "The cat sat. It was happy. The sun was warm. It slept.";
pub const SEGMENT_ZERO_SPOKEN: &str = "the cat sat it was happy the sun was warm";

/// Twelve sentences: four segments of three.
pub const LONG_CHAPTER: &str = "One. Two. Three. Four. Five. Six. Seven. Eight. Nine. Ten. Eleven. Twelve.";

//
// ─── RECOGNIZER ────────────────────────────────────────────────────────────────
//

#[derive(Default)]
pub struct ScriptedRecognizer {
    sink: Mutex<Option<EventSink>>,
    locales: Mutex<Vec<String>>,
    starts: AtomicUsize,
    stops: AtomicUsize,
    aborts: AtomicUsize,
    fail_start: Mutex<Option<RecognitionError>>,
}

impl ScriptedRecognizer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_start(err: RecognitionError) -> Arc<Self> {
        let recognizer = Self::default();
        *recognizer.fail_start.lock().unwrap() = Some(err);
        Arc::new(recognizer)
    }

    /// Sink of the most recent attempt.
    pub fn sink(&self) -> EventSink {
        self.sink.lock().unwrap().clone().expect("recognizer was started")
    }

    pub fn emit(&self, event: SpeechEvent) {
        self.sink().send(event);
    }

    pub fn say_final(&self, result_index: usize, text: &str) {
        self.emit(SpeechEvent::Result {
            result_index,
            results: vec![RecognitionChunk::final_text(text)],
        });
    }

    pub fn say_interim(&self, result_index: usize, text: &str) {
        self.emit(SpeechEvent::Result {
            result_index,
            results: vec![RecognitionChunk::interim(text)],
        });
    }

    pub fn locales(&self) -> Vec<String> {
        self.locales.lock().unwrap().clone()
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn aborts(&self) -> usize {
        self.aborts.load(Ordering::SeqCst)
    }
}

impl SpeechRecognizer for ScriptedRecognizer {
    fn start(&self, locale: &str, sink: EventSink) -> Result<(), RecognitionError> {
        if let Some(err) = self.fail_start.lock().unwrap().clone() {
            return Err(err);
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.locales.lock().unwrap().push(locale.to_string());
        *self.sink.lock().unwrap() = Some(sink);
        Ok(())
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    fn abort(&self) {
        self.aborts.fetch_add(1, Ordering::SeqCst);
    }
}

//
// ─── SYNTHESIZER ───────────────────────────────────────────────────────────────
//

#[derive(Default)]
pub struct RecordingSynthesizer {
    pub voices: Vec<Voice>,
    pub spoken: Mutex<Vec<Utterance>>,
    pub cancels: AtomicUsize,
}

impl SpeechSynthesizer for RecordingSynthesizer {
    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }

    fn speak(&self, utterance: Utterance) {
        self.spoken.lock().unwrap().push(utterance);
    }
}

//
// ─── ANALYZERS ─────────────────────────────────────────────────────────────────
//

/// Reports one substitution per call and records what it was asked.
/// Fails for any target containing `fail_on`.
#[derive(Default)]
pub struct ScriptedAnalyzer {
    pub calls: Mutex<Vec<(String, String)>>,
    pub fail_on: Option<String>,
}

impl ScriptedAnalyzer {
    pub fn failing_on(target: &str) -> Self {
        Self {
            fail_on: Some(target.to_string()),
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl MistakeAnalyzer for ScriptedAnalyzer {
    async fn analyze(&self, spoken: &str, target: &str) -> Result<Vec<Mistake>, AnalysisError> {
        self.calls
            .lock()
            .unwrap()
            .push((spoken.to_string(), target.to_string()));
        if self.fail_on.as_deref().is_some_and(|needle| target.contains(needle)) {
            return Err(AnalysisError::Failed("model unavailable".into()));
        }
        Ok(vec![Mistake::new("hapy", "happy").unwrap()])
    }
}

/// Every call waits until `parties` calls are in flight at once.
pub struct BarrierAnalyzer {
    barrier: Barrier,
}

impl BarrierAnalyzer {
    pub fn new(parties: usize) -> Self {
        Self {
            barrier: Barrier::new(parties),
        }
    }
}

#[async_trait]
impl MistakeAnalyzer for BarrierAnalyzer {
    async fn analyze(&self, _spoken: &str, _target: &str) -> Result<Vec<Mistake>, AnalysisError> {
        self.barrier.wait().await;
        Ok(Vec::new())
    }
}

/// Takes `delay` per call, then reports nothing.
pub struct SlowAnalyzer {
    delay: Duration,
}

impl SlowAnalyzer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl MistakeAnalyzer for SlowAnalyzer {
    async fn analyze(&self, _spoken: &str, _target: &str) -> Result<Vec<Mistake>, AnalysisError> {
        tokio::time::sleep(self.delay).await;
        Ok(Vec::new())
    }
}

//
// ─── PROGRESS ──────────────────────────────────────────────────────────────────
//

/// In-memory repository that counts writes.
#[derive(Default)]
pub struct CountingRepo {
    inner: InMemoryRepository,
    saves: AtomicUsize,
    deletes: AtomicUsize,
}

impl CountingRepo {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub async fn stored(&self, key: &ProgressKey) -> Option<usize> {
        self.inner
            .get_progress(key)
            .await
            .unwrap()
            .map(|record| record.segment_index())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

#[async_trait]
impl ProgressRepository for CountingRepo {
    async fn get_progress(&self, key: &ProgressKey) -> Result<Option<ProgressRecord>, StorageError> {
        self.inner.get_progress(key).await
    }

    async fn save_progress(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save_progress(record).await
    }

    async fn delete_progress(&self, key: &ProgressKey) -> Result<(), StorageError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete_progress(key).await
    }
}

//
// ─── BUILDERS ──────────────────────────────────────────────────────────────────
//

pub fn english_chapter() -> SessionConfig {
    SessionConfig::curriculum(Some("1".into()), "English")
}

pub fn engine_with(
    config: SessionConfig,
    repo: Arc<dyn ProgressRepository>,
    analyzer: Arc<dyn MistakeAnalyzer>,
    recognizer: Option<Arc<ScriptedRecognizer>>,
) -> ReadingEngine {
    let engine = ReadingEngine::new(config, repo, analyzer).with_clock(fixed_clock());
    match recognizer {
        Some(recognizer) => engine.with_recognizer(recognizer),
        None => engine,
    }
}

pub fn progress_key(config: &SessionConfig, title: &str) -> ProgressKey {
    config.progress_key(Some(title)).expect("key")
}
