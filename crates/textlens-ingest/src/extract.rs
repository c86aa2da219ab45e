//! Heuristic text extraction that runs without any model or network.
//!
//! The summarizer here is the guaranteed fallback of every summarization
//! path, so everything in this module is pure, total and deterministic.

pub mod entities;
pub mod sentences;
pub mod sentiment;
pub mod summary;

pub use entities::{extract_entities, EntityKind, EntityMention};
pub use sentences::split_sentences;
pub use sentiment::{score_sentiment, SentimentScore};
pub use summary::{summarize, truncate_words};
