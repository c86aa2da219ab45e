//! Generative text with external LLM streaming (Gemini/OpenAI/Anthropic),
//! and the summarization capability that falls back to the extractive
//! summarizer whenever generation is unavailable or fails.

pub mod config;
pub mod generator;
pub mod providers;
pub mod summarizer;
pub mod types;

pub use config::GeneratorConfig;
pub use generator::{Generator, LlmGenerator};
pub use summarizer::Summarizer;
pub use types::*;
