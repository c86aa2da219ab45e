//! Annotation result types.

use serde::{Deserialize, Serialize};

/// A named entity with its type and salience.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub salience: f64,
}

impl Entity {
    /// Salience is kept to three decimals.
    pub fn new(name: impl Into<String>, kind: impl Into<String>, salience: f64) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            salience: round3(salience),
        }
    }
}

/// Document-level sentiment: `score` in `[-1, 1]`, `magnitude` ≥ 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub score: f64,
    pub magnitude: f64,
}

impl Sentiment {
    /// Both values are kept to three decimals.
    pub fn new(score: f64, magnitude: f64) -> Self {
        Self {
            score: round3(score),
            magnitude: round3(magnitude),
        }
    }
}

pub(crate) fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}
