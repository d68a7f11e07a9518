use super::RecognitionChunk;

/// Cumulative view of one recognition attempt.
///
/// Result events replace every slot from their `result_index` on, so a final
/// result always supersedes the interim text it was built from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptBuffer {
    slots: Vec<RecognitionChunk>,
}

impl TranscriptBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, result_index: usize, results: &[RecognitionChunk]) {
        self.slots.truncate(result_index);
        self.slots.extend_from_slice(results);
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Text of all final results, space separated.
    #[must_use]
    pub fn final_text(&self) -> String {
        join(self.slots.iter().filter(|chunk| chunk.is_final))
    }

    #[must_use]
    pub fn interim_text(&self) -> String {
        join(self.slots.iter().filter(|chunk| !chunk.is_final))
    }

    /// Everything heard so far: final results followed by pending interim text.
    #[must_use]
    pub fn spoken_text(&self) -> String {
        let final_text = self.final_text();
        let interim = self.interim_text();
        match (final_text.is_empty(), interim.is_empty()) {
            (_, true) => final_text,
            (true, false) => interim,
            (false, false) => format!("{final_text} {interim}"),
        }
    }
}

fn join<'a>(chunks: impl Iterator<Item = &'a RecognitionChunk>) -> String {
    chunks
        .map(|chunk| chunk.transcript.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn final_result_supersedes_interim() {
        let mut buffer = TranscriptBuffer::new();
        buffer.apply(0, &[RecognitionChunk::interim("the cat")]);
        assert_eq!(buffer.spoken_text(), "the cat");
        assert_eq!(buffer.final_text(), "");

        buffer.apply(0, &[RecognitionChunk::final_text("the cat sat")]);
        assert_eq!(buffer.final_text(), "the cat sat");
        assert_eq!(buffer.interim_text(), "");
    }

    #[test]
    fn later_slots_accumulate() {
        let mut buffer = TranscriptBuffer::new();
        buffer.apply(0, &[RecognitionChunk::final_text("the cat sat ")]);
        buffer.apply(1, &[RecognitionChunk::interim("it was")]);
        assert_eq!(buffer.spoken_text(), "the cat sat it was");

        buffer.apply(
            1,
            &[
                RecognitionChunk::final_text("it was happy"),
                RecognitionChunk::interim("the sun"),
            ],
        );
        assert_eq!(buffer.final_text(), "the cat sat it was happy");
        assert_eq!(buffer.spoken_text(), "the cat sat it was happy the sun");

        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.spoken_text(), "");
    }
}
