use std::sync::Arc;

use reading_core::model::Language;

/// A voice offered by the platform synthesizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    /// BCP 47 tag such as `hi-IN`.
    pub lang: String,
}

impl Voice {
    #[must_use]
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub text: String,
    /// `None` lets the platform pick its default voice.
    pub voice: Option<Voice>,
}

/// Platform text-to-speech. There is one playback channel per process.
pub trait SpeechSynthesizer: Send + Sync {
    /// Voices loaded so far; may be empty while the platform warms up.
    fn voices(&self) -> Vec<Voice>;

    fn cancel(&self);

    fn speak(&self, utterance: Utterance);
}

/// Replays single expected words for the reader.
#[derive(Clone, Default)]
pub struct PronunciationHelper {
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
}

impl PronunciationHelper {
    #[must_use]
    pub fn new(synthesizer: Option<Arc<dyn SpeechSynthesizer>>) -> Self {
        Self { synthesizer }
    }

    /// Speak `word`, preempting anything still playing.
    ///
    /// Returns `false` when nothing was spoken: no synthesizer, no voices yet,
    /// or a blank word.
    pub fn speak(&self, word: &str, language: Language) -> bool {
        let Some(synthesizer) = self.synthesizer.as_ref() else {
            return false;
        };
        let word = word.trim();
        if word.is_empty() {
            return false;
        }
        let voices = synthesizer.voices();
        if voices.is_empty() {
            tracing::debug!("no synthesis voices loaded yet");
            return false;
        }

        synthesizer.cancel();
        synthesizer.speak(Utterance {
            text: word.to_string(),
            voice: pick_voice(&voices, language),
        });
        true
    }

    pub fn stop(&self) {
        if let Some(synthesizer) = self.synthesizer.as_ref() {
            synthesizer.cancel();
        }
    }
}

impl std::fmt::Debug for PronunciationHelper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PronunciationHelper")
            .field("available", &self.synthesizer.is_some())
            .finish()
    }
}

fn pick_voice(voices: &[Voice], language: Language) -> Option<Voice> {
    voices
        .iter()
        .find(|voice| voice.lang.starts_with(language.code()))
        .or_else(|| voices.iter().find(|voice| voice.lang.starts_with("en")))
        .cloned()
}
