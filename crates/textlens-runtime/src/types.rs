//! Runtime types.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;
use textlens_annotate::{Entity, Sentiment};
use textlens_core::Outcome;
use textlens_resolve::Candidate;

/// Which agent implementation answers a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentMode {
    /// Retrieve, analyze, then summarize the summaries.
    Simple,
    /// Staged run over an [`AgentState`] with memory blending, model
    /// synthesis and run persistence.
    #[default]
    Graph,
}

impl FromStr for AgentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "graph" | "langgraph" => Ok(Self::Graph),
            other => Err(format!("unknown agent mode '{}' (expected simple or graph)", other)),
        }
    }
}

impl fmt::Display for AgentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple => write!(f, "simple"),
            Self::Graph => write!(f, "graph"),
        }
    }
}

/// Annotations of one text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_index: Option<usize>,
    pub entities: Outcome<Vec<Entity>>,
    pub sentiment: Outcome<Sentiment>,
    pub summary: String,
}

/// Final agent output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentAnswer {
    pub query: String,
    pub answer: String,
    pub support: Vec<Analysis>,
}

/// Stages of the graph agent, run in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentStage {
    Retrieve,
    Analyze,
    Synthesize,
}

impl AgentStage {
    pub const ORDER: [AgentStage; 3] = [Self::Retrieve, Self::Analyze, Self::Synthesize];
}

/// State threaded through the graph agent's stages.
#[derive(Debug, Clone, Default)]
pub struct AgentState {
    pub query: String,
    pub candidates: Vec<Candidate>,
    pub analyses: Vec<Analysis>,
    pub answer: String,
}

impl AgentState {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn into_answer(self) -> AgentAnswer {
        AgentAnswer {
            query: self.query,
            answer: self.answer,
            support: self.analyses,
        }
    }
}

/// What a pipeline run produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub rows: usize,
    /// Rows whose entity or sentiment call failed.
    pub failed_annotations: usize,
    pub results_path: PathBuf,
    pub eda_path: PathBuf,
    pub log_path: PathBuf,
}

/// What the memory setup verb did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MemorySetupReport {
    /// Texts written to the vector memory, when the index was built.
    pub indexed: Option<usize>,
    /// Run log that was ensured, if any.
    pub run_log: Option<String>,
}
