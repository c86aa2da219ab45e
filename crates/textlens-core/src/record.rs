//! Dataset records and their transient retrieval scores.

use serde::{Deserialize, Serialize};

/// One unit of text plus its stable source row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub text: String,
    /// 0-based data row in the source dataset.
    pub row_index: usize,
}

impl Record {
    pub fn new(text: impl Into<String>, row_index: usize) -> Self {
        Self {
            text: text.into(),
            row_index,
        }
    }
}

/// A record ranked against a query. Higher score means more relevant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredRecord {
    #[serde(flatten)]
    pub record: Record,
    pub score: usize,
}

impl ScoredRecord {
    pub fn text(&self) -> &str {
        &self.record.text
    }

    pub fn row_index(&self) -> usize {
        self.record.row_index
    }
}
