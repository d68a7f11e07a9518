//! Live word matching between a streamed transcript and the target segment.
//!
//! The matched count is the number of spoken tokens, not an alignment score:
//! any spoken word advances visual progress. Exact comparison happens later,
//! in the mistake report.

/// Lower-case a single token and strip `. , ? !`.
fn clean_word(word: &str) -> String {
    word.trim()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '.' | ',' | '?' | '!'))
        .collect()
}

/// Normalized, non-empty tokens of `text`.
#[must_use]
pub fn normalize_words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(clean_word)
        .filter(|word| !word.is_empty())
        .collect()
}

/// Progress of one reading attempt against its segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WordMatch {
    pub matched: usize,
    pub target: usize,
}

impl WordMatch {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.matched >= self.target
    }
}

/// Compare everything heard so far with the target segment text.
#[must_use]
pub fn match_words(transcript: &str, target: &str) -> WordMatch {
    WordMatch {
        matched: normalize_words(transcript).len(),
        target: normalize_words(target).len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_ignores_case_and_punctuation() {
        assert_eq!(normalize_words("Cat, Sat!"), vec!["cat", "sat"]);
        assert_eq!(
            match_words("Cat, Sat!", "cat sat"),
            match_words("cat sat", "cat sat")
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize_words("  Hello,  WORLD?! ... again. ");
        let twice = normalize_words(&once.join(" "));
        assert_eq!(once, twice);
        assert_eq!(once, vec!["hello", "world", "again"]);
    }

    #[test]
    fn punctuation_only_tokens_are_dropped() {
        assert_eq!(normalize_words("well , ... ok"), vec!["well", "ok"]);
    }

    #[test]
    fn completion_tracks_target_length() {
        let target = "The cat sat. It was happy. The sun was warm.";
        for spoken in 0..=12 {
            let transcript = vec!["word"; spoken].join(" ");
            let result = match_words(&transcript, target);
            assert_eq!(result.target, 10);
            assert_eq!(result.matched, spoken);
            assert_eq!(result.is_complete(), spoken >= 10);
        }
    }

    #[test]
    fn wrong_words_still_count_toward_progress() {
        let result = match_words("the bat sad", "The cat sat.");
        assert_eq!(result.matched, 3);
        assert!(result.is_complete());
    }

    #[test]
    fn full_scenario_segment_completes() {
        let result = match_words(
            "the cat sat it was happy the sun was warm",
            "The cat sat. It was happy. The sun was warm.",
        );
        assert_eq!(result, WordMatch { matched: 10, target: 10 });
        assert!(result.is_complete());
    }
}
