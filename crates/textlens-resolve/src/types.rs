//! Retrieval types.

use serde::{Deserialize, Serialize};
use textlens_core::ScoredRecord;

/// Where a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateSource {
    /// Keyword overlap against the loaded dataset.
    Keyword,
    /// Similarity search over the vector memory.
    Memory,
}

/// A text selected for analysis by the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub text: String,
    /// Dataset row, when known. Memory hits only carry one if the text was
    /// indexed from the dataset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_index: Option<usize>,
    pub score: f64,
    pub source: CandidateSource,
}

impl Candidate {
    pub fn from_memory(text: impl Into<String>, row_index: Option<usize>, score: f64) -> Self {
        Self {
            text: text.into(),
            row_index,
            score,
            source: CandidateSource::Memory,
        }
    }
}

impl From<ScoredRecord> for Candidate {
    fn from(scored: ScoredRecord) -> Self {
        Self {
            text: scored.record.text,
            row_index: Some(scored.record.row_index),
            score: scored.score as f64,
            source: CandidateSource::Keyword,
        }
    }
}
