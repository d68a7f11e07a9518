//! Splits a document into reading segments.
//!
//! Sentences end at a run of `.`, `!` or `?`. Complete sentences are grouped
//! into segments of at most [`SENTENCES_PER_SEGMENT`]; whatever trails the last
//! terminal mark becomes a final segment of its own. Text with no terminal
//! mark at all is a single sentence.

use crate::model::Segment;

/// Upper bound on complete sentences per segment.
pub const SENTENCES_PER_SEGMENT: usize = 3;

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Segment `text` for reading.
///
/// Returns an empty list only when `text` is blank.
#[must_use]
pub fn segment_text(text: &str) -> Vec<Segment> {
    let (sentences, tail) = split_sentences(text);

    let mut segments: Vec<Segment> = sentences
        .chunks(SENTENCES_PER_SEGMENT)
        .filter_map(|group| Segment::parse(group.join(" ")).ok())
        .collect();

    if let Some(tail) = tail.and_then(|tail| Segment::parse(tail).ok()) {
        segments.push(tail);
    }

    segments
}

/// Returns the complete sentences and the unterminated remainder, if any.
fn split_sentences(text: &str) -> (Vec<&str>, Option<&str>) {
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if !is_terminal(c) {
            continue;
        }
        let mut end = idx + c.len_utf8();
        while let Some(&(next_idx, next)) = chars.peek() {
            if !is_terminal(next) {
                break;
            }
            end = next_idx + next.len_utf8();
            chars.next();
        }

        let has_words = text[start..end]
            .chars()
            .any(|ch| !ch.is_whitespace() && !is_terminal(ch));
        match ranges.last_mut() {
            // A stray run of marks ("Hi. ...") belongs to the sentence before it.
            Some(previous) if !has_words => previous.1 = end,
            _ => ranges.push((start, end)),
        }
        start = end;
    }

    let sentences = ranges.into_iter().map(|(from, to)| &text[from..to]).collect();
    let tail = &text[start..];
    let tail = (!tail.trim().is_empty()).then_some(tail);
    (sentences, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(segments: &[Segment]) -> Vec<&str> {
        segments.iter().map(Segment::as_str).collect()
    }

    fn squash(text: &str) -> String {
        text.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn groups_three_sentences_per_segment() {
        let segments = segment_text("The cat sat. It was happy. The sun was warm. It slept.");
        assert_eq!(
            texts(&segments),
            vec!["The cat sat. It was happy. The sun was warm.", "It slept."]
        );
    }

    #[test]
    fn text_without_terminal_marks_is_one_segment() {
        let segments = segment_text("a happy child am I");
        assert_eq!(texts(&segments), vec!["a happy child am I"]);
    }

    #[test]
    fn unterminated_tail_becomes_its_own_segment() {
        let segments = segment_text("One. Two! Three? and then");
        assert_eq!(texts(&segments), vec!["One. Two! Three?", "and then"]);

        let segments = segment_text("One. Two and");
        assert_eq!(texts(&segments), vec!["One.", "Two and"]);
    }

    #[test]
    fn blank_input_yields_no_segments() {
        assert!(segment_text("").is_empty());
        assert!(segment_text("   \n ").is_empty());
    }

    #[test]
    fn repeated_marks_stay_with_their_sentence() {
        let segments = segment_text("Wait... What?! Yes. ... Done.");
        assert_eq!(texts(&segments), vec!["Wait... What?! Yes. ...", "Done."]);
    }

    #[test]
    fn segments_reconstruct_input_and_respect_cap() {
        let inputs = [
            "The cat sat. It was happy. The sun was warm. It slept.",
            "  Spaced   out.\n\nNew paragraph!  Another one?  Tail words",
            "Hi.There.Again.And.Once more",
            "मेरा घर लाल है. मैं खुश हूँ! तुम? ठीक",
            "...leading marks. then text",
            "no marks at all",
        ];

        for input in inputs {
            let segments = segment_text(input);
            assert!(!segments.is_empty(), "{input:?}");
            let joined: String = segments.iter().map(Segment::as_str).collect();
            assert_eq!(squash(&joined), squash(input), "{input:?}");

            for segment in &segments {
                assert!(!segment.as_str().trim().is_empty());
                let sentences = segment
                    .as_str()
                    .split(is_terminal)
                    .filter(|part| part.chars().any(|c| !c.is_whitespace()))
                    .count();
                assert!(sentences <= SENTENCES_PER_SEGMENT, "{segment:?}");
            }
        }
    }

    #[test]
    fn segmenting_is_deterministic() {
        let text = "One. Two. Three. Four. Five. Six. Seven.";
        assert_eq!(segment_text(text), segment_text(text));
        assert_eq!(segment_text(text).len(), 3);
    }
}
