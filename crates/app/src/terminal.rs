//! Terminal stand-ins for the platform speech capabilities.
//!
//! Typed lines play the part of recognized speech, and "spoken" words are
//! printed to stderr.

use std::sync::Mutex;

use services::error::RecognitionError;
use services::speech::{
    EventSink, RecognitionChunk, SpeechEvent, SpeechRecognizer, SpeechSynthesizer, Utterance,
    Voice,
};

#[derive(Default)]
struct Attempt {
    sink: Option<EventSink>,
    next_slot: usize,
}

/// Recognizer fed by [`LineRecognizer::hear`]. Every line becomes one final
/// result of the running attempt.
#[derive(Default)]
pub struct LineRecognizer {
    attempt: Mutex<Attempt>,
}

impl LineRecognizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `line` as speech. Returns `false` when not listening.
    pub fn hear(&self, line: &str) -> bool {
        let Ok(mut attempt) = self.attempt.lock() else {
            return false;
        };
        let slot = attempt.next_slot;
        let Some(sink) = attempt.sink.as_ref() else {
            return false;
        };
        let delivered = sink.send(SpeechEvent::Result {
            result_index: slot,
            results: vec![RecognitionChunk::final_text(line)],
        });
        attempt.next_slot += 1;
        delivered
    }
}

impl SpeechRecognizer for LineRecognizer {
    fn start(&self, locale: &str, sink: EventSink) -> Result<(), RecognitionError> {
        let mut attempt = self
            .attempt
            .lock()
            .map_err(|e| RecognitionError::StartFailed(e.to_string()))?;
        if attempt.sink.is_some() {
            return Err(RecognitionError::AlreadyStarted);
        }
        sink.send(SpeechEvent::Start);
        tracing::debug!(locale, "terminal recognizer listening");
        *attempt = Attempt {
            sink: Some(sink),
            next_slot: 0,
        };
        Ok(())
    }

    fn stop(&self) {
        if let Ok(mut attempt) = self.attempt.lock() {
            if let Some(sink) = attempt.sink.take() {
                sink.send(SpeechEvent::End);
            }
        }
    }

    fn abort(&self) {
        if let Ok(mut attempt) = self.attempt.lock() {
            if let Some(sink) = attempt.sink.take() {
                sink.send(SpeechEvent::Error(
                    services::speech::RecognitionErrorCode::Aborted,
                ));
            }
        }
    }
}

/// Prints utterances instead of playing them.
#[derive(Debug, Default)]
pub struct PrintingSynthesizer;

impl SpeechSynthesizer for PrintingSynthesizer {
    fn voices(&self) -> Vec<Voice> {
        vec![
            Voice::new("terminal-en", "en-IN"),
            Voice::new("terminal-hi", "hi-IN"),
        ]
    }

    fn cancel(&self) {}

    fn speak(&self, utterance: Utterance) {
        let voice = utterance
            .voice
            .map_or_else(|| "default".to_string(), |voice| voice.name);
        eprintln!("  (say: {} [{voice}])", utterance.text);
    }
}
