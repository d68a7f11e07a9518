use std::time::Duration;

use reading_core::model::{Language, ProgressKey, ReadingMode};

/// Pause between detected completion and the automatic advance, so a final
/// recognition result can replace the interim text first.
pub const DEFAULT_GRACE_DELAY: Duration = Duration::from_millis(1200);

/// Parameters for one reading engine: who reads, what kind of content, and
/// in which language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    class: Option<String>,
    mode: ReadingMode,
    language: Language,
    grace_delay: Duration,
}

impl SessionConfig {
    /// Curriculum chapters; the subject picks the language.
    #[must_use]
    pub fn curriculum(class: Option<String>, subject: impl Into<String>) -> Self {
        let subject = subject.into();
        Self {
            class,
            language: Language::for_subject(&subject),
            mode: ReadingMode::Curriculum { subject },
            grace_delay: DEFAULT_GRACE_DELAY,
        }
    }

    #[must_use]
    pub fn story(class: Option<String>, language: Language) -> Self {
        Self {
            class,
            mode: ReadingMode::Story,
            language,
            grace_delay: DEFAULT_GRACE_DELAY,
        }
    }

    #[must_use]
    pub fn with_grace_delay(mut self, grace_delay: Duration) -> Self {
        self.grace_delay = grace_delay;
        self
    }

    #[must_use]
    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    #[must_use]
    pub fn mode(&self) -> &ReadingMode {
        &self.mode
    }

    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }

    #[must_use]
    pub fn grace_delay(&self) -> Duration {
        self.grace_delay
    }

    /// Key under which progress for `title` is kept, if it can be kept at all.
    #[must_use]
    pub fn progress_key(&self, title: Option<&str>) -> Option<ProgressKey> {
        ProgressKey::derive(
            self.class.as_deref(),
            &self.mode.scope_id(self.language),
            title,
        )
    }
}
