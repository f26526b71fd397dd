//! Prompt composition for answer generation

pub mod prompt;

pub use prompt::PromptBuilder;
