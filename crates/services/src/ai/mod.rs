//! Chat-completion backed implementations of the analysis and story seams.

mod analyzer;
mod client;
mod story;

pub use analyzer::{AiMistakeAnalyzer, parse_mistakes};
pub use client::{ChatClient, settings_from_env, settings_from_vars};
pub use story::{AiStoryGenerator, story_prompt};
