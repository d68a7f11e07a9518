//! Live speech recognition and synthesis seams.
//!
//! The platform recognizer pushes events into an [`EventSink`]; the
//! [`SpeechSessionAdapter`] owns the receiving end and is the single consumer.
//! Every `start` opens a new attempt and `abort` retires it, so events that
//! straggle in from an aborted attempt are dropped before anyone sees them.

mod synthesis;
mod transcript;

use std::fmt;
use std::sync::Arc;

use reading_core::model::Language;
use tokio::sync::mpsc;

use crate::error::RecognitionError;

pub use synthesis::{PronunciationHelper, SpeechSynthesizer, Utterance, Voice};
pub use transcript::TranscriptBuffer;

pub const UNAVAILABLE_MESSAGE: &str = "Speech recognition is not supported on this device.";

/// One recognizer result slot, interim or final.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionChunk {
    pub transcript: String,
    pub is_final: bool,
}

impl RecognitionChunk {
    #[must_use]
    pub fn interim(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: false,
        }
    }

    #[must_use]
    pub fn final_text(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: true,
        }
    }
}

/// Error codes reported by the recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionErrorCode {
    NoSpeech,
    Aborted,
    NotAllowed,
    AudioCapture,
    Network,
    Other(String),
}

impl RecognitionErrorCode {
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            "no-speech" => Self::NoSpeech,
            "aborted" => Self::Aborted,
            "not-allowed" => Self::NotAllowed,
            "audio-capture" => Self::AudioCapture,
            "network" => Self::Network,
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::NoSpeech => "no-speech",
            Self::Aborted => "aborted",
            Self::NotAllowed => "not-allowed",
            Self::AudioCapture => "audio-capture",
            Self::Network => "network",
            Self::Other(code) => code,
        }
    }

    /// Silence and caller aborts are routine and never shown to the reader.
    #[must_use]
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::NoSpeech | Self::Aborted)
    }
}

impl fmt::Display for RecognitionErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events emitted by a recognizer during one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    Start,
    /// `results[i]` is the recognizer's result slot `result_index + i`.
    Result {
        result_index: usize,
        results: Vec<RecognitionChunk>,
    },
    Error(RecognitionErrorCode),
    End,
}

/// Sending half handed to a recognizer on `start`.
#[derive(Clone, Debug)]
pub struct EventSink {
    attempt: u64,
    tx: mpsc::UnboundedSender<(u64, SpeechEvent)>,
}

impl EventSink {
    /// Deliver an event. Returns `false` once the adapter is gone.
    pub fn send(&self, event: SpeechEvent) -> bool {
        self.tx.send((self.attempt, event)).is_ok()
    }
}

/// Platform capability for continuous, streaming recognition.
pub trait SpeechRecognizer: Send + Sync {
    /// Begin recognizing in `locale`, reporting through `sink`.
    ///
    /// # Errors
    ///
    /// Returns `RecognitionError` if the microphone or engine cannot start.
    fn start(&self, locale: &str, sink: EventSink) -> Result<(), RecognitionError>;

    /// Stop listening but let in-flight audio produce its results.
    fn stop(&self);

    /// Stop immediately and discard pending results.
    fn abort(&self);
}

/// What happened on a `start` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyActive,
    Unavailable,
}

/// Owns the recognizer handle and the single event stream for an engine.
pub struct SpeechSessionAdapter {
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    locale: &'static str,
    tx: mpsc::UnboundedSender<(u64, SpeechEvent)>,
    rx: mpsc::UnboundedReceiver<(u64, SpeechEvent)>,
    attempt: u64,
    active: bool,
    unavailable_reported: bool,
}

impl SpeechSessionAdapter {
    /// `None` means the platform offers no recognition.
    #[must_use]
    pub fn new(recognizer: Option<Arc<dyn SpeechRecognizer>>, language: Language) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            recognizer,
            locale: language.locale(),
            tx,
            rx,
            attempt: 0,
            active: false,
            unavailable_reported: false,
        }
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.recognizer.is_some()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn locale(&self) -> &'static str {
        self.locale
    }

    /// The unavailability message, returned only the first time it is asked for.
    pub fn take_unavailable_notice(&mut self) -> Option<&'static str> {
        if self.recognizer.is_some() || self.unavailable_reported {
            return None;
        }
        self.unavailable_reported = true;
        Some(UNAVAILABLE_MESSAGE)
    }

    /// Start a new attempt. No-op while one is already running.
    ///
    /// # Errors
    ///
    /// Returns `RecognitionError` when the recognizer refuses to start.
    pub fn start(&mut self) -> Result<StartOutcome, RecognitionError> {
        let Some(recognizer) = self.recognizer.as_ref() else {
            return Ok(StartOutcome::Unavailable);
        };
        if self.active {
            return Ok(StartOutcome::AlreadyActive);
        }

        self.attempt += 1;
        let sink = EventSink {
            attempt: self.attempt,
            tx: self.tx.clone(),
        };
        recognizer.start(self.locale, sink)?;
        self.active = true;
        tracing::debug!(attempt = self.attempt, locale = self.locale, "recognition started");
        Ok(StartOutcome::Started)
    }

    /// Graceful stop; results of the current attempt keep flowing until `End`.
    pub fn stop(&mut self) {
        if let Some(recognizer) = self.recognizer.as_ref() {
            if self.active {
                recognizer.stop();
            }
        }
    }

    /// Immediate stop; anything the current attempt still sends is discarded.
    pub fn abort(&mut self) {
        let Some(recognizer) = self.recognizer.as_ref() else {
            return;
        };
        if self.active {
            recognizer.abort();
            tracing::debug!(attempt = self.attempt, "recognition aborted");
        }
        self.active = false;
        self.attempt += 1;
    }

    /// Next event of the live attempt.
    ///
    /// Cancel-safe. Never resolves when no recognizer is present.
    pub async fn next_event(&mut self) -> Option<SpeechEvent> {
        loop {
            let (attempt, event) = self.rx.recv().await?;
            if attempt != self.attempt {
                continue;
            }
            if matches!(event, SpeechEvent::End | SpeechEvent::Error(_)) {
                self.active = false;
            }
            return Some(event);
        }
    }
}

impl fmt::Debug for SpeechSessionAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechSessionAdapter")
            .field("available", &self.recognizer.is_some())
            .field("locale", &self.locale)
            .field("attempt", &self.attempt)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}
