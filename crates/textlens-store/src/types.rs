//! Stored row types.

use serde::{Deserialize, Serialize};

/// Result of writing a text into the vector memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// New row with this id.
    Inserted(i64),
    /// The text was already stored; its metadata was merged.
    Merged(i64),
}

impl Upsert {
    pub fn id(&self) -> i64 {
        match self {
            Self::Inserted(id) | Self::Merged(id) => *id,
        }
    }
}

/// A similarity-search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryHit {
    pub id: i64,
    pub text: String,
    pub metadata: serde_json::Value,
    /// Cosine similarity in `[-1, 1]`.
    pub score: f64,
}

impl MemoryHit {
    /// Dataset row recorded in the metadata, if any.
    pub fn row_index(&self) -> Option<usize> {
        self.metadata["row_index"]
            .as_u64()
            .and_then(|v| usize::try_from(v).ok())
    }
}

/// One logged agent run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    /// RFC 3339 UTC timestamp.
    pub ts: String,
    pub query: String,
    pub answer: String,
    /// JSON-encoded support analyses.
    pub support: String,
}
