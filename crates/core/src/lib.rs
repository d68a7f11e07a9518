#![forbid(unsafe_code)]

pub mod matcher;
pub mod model;
pub mod segmenter;
pub mod time;

pub use matcher::{WordMatch, match_words, normalize_words};
pub use segmenter::{SENTENCES_PER_SEGMENT, segment_text};
pub use time::Clock;
