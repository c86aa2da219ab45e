//! Process settings, read once from the environment at startup.
//!
//! `.env` loading happens in the binary before [`Settings::from_env`] runs;
//! after that the value is immutable and passed explicitly to every
//! component that needs it.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

pub const DEFAULT_DATASET_PATH: &str = "data/sample_reviews.csv";
pub const DEFAULT_TEXT_COL: &str = "original_text";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-haiku-20241022";

/// Which summarization strategy the summarizer should prefer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryStrategy {
    /// Generative when a model provider resolves, extractive otherwise.
    #[default]
    Auto,
    Generative,
    Extractive,
}

impl FromStr for SummaryStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "generative" => Ok(Self::Generative),
            "extractive" => Ok(Self::Extractive),
            other => Err(Error::Config(format!("unknown summary strategy: {other}"))),
        }
    }
}

/// Which annotator backs entity and sentiment extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotatorChoice {
    /// Cloud Natural Language when an API key is present, heuristics otherwise.
    #[default]
    Auto,
    Cloud,
    Heuristic,
}

impl FromStr for AnnotatorChoice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "cloud" => Ok(Self::Cloud),
            "heuristic" => Ok(Self::Heuristic),
            other => Err(Error::Config(format!("unknown annotator: {other}"))),
        }
    }
}

/// Generative model credentials and model names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// `auto`, `gemini`, `openai` or `anthropic`.
    pub preferred_provider: String,
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub gemini_model: String,
    pub openai_model: String,
    pub anthropic_model: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            preferred_provider: "auto".into(),
            gemini_api_key: None,
            openai_api_key: None,
            anthropic_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.into(),
            openai_model: DEFAULT_OPENAI_MODEL.into(),
            anthropic_model: DEFAULT_ANTHROPIC_MODEL.into(),
        }
    }
}

/// Top-level textlens settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub project_id: String,
    pub region: String,
    pub gcs_bucket: String,
    /// Local path or `gs://bucket/object`.
    pub dataset_path: String,
    /// Bearer token for non-public `gs://` objects.
    pub gcs_access_token: Option<String>,
    pub text_col: String,
    /// Directory for `results.csv`, `eda.txt` and `log.txt`.
    pub output_dir: PathBuf,
    pub summary_strategy: SummaryStrategy,
    /// Word budget for per-row summaries.
    pub summary_max_words: usize,
    /// Word budget for the agent's extractive answer fallback.
    pub answer_max_words: usize,
    pub google_api_key: Option<String>,
    pub annotator: AnnotatorChoice,
    pub llm: LlmSettings,
    pub use_memory: bool,
    pub memory_dir: PathBuf,
    pub embedding_dim: usize,
    pub run_log_db: PathBuf,
    pub run_log_table: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            region: "us-central1".into(),
            gcs_bucket: String::new(),
            dataset_path: DEFAULT_DATASET_PATH.into(),
            gcs_access_token: None,
            text_col: DEFAULT_TEXT_COL.into(),
            output_dir: PathBuf::from("outputs"),
            summary_strategy: SummaryStrategy::Auto,
            summary_max_words: 10,
            answer_max_words: 10,
            google_api_key: None,
            annotator: AnnotatorChoice::Auto,
            llm: LlmSettings::default(),
            use_memory: false,
            memory_dir: PathBuf::from("outputs/memory"),
            embedding_dim: 256,
            run_log_db: PathBuf::from("outputs/runs.db"),
            run_log_table: "agent_runs".into(),
        }
    }
}

impl Settings {
    /// Build settings from the process environment and defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        // Empty values behave like unset ones.
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let flag = |key: &str| get(key).map(|v| v.trim().eq_ignore_ascii_case("true"));
        let number = |key: &str, fallback: usize| {
            get(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(fallback)
        };

        let google_api_key = get("GOOGLE_API_KEY");
        let openai_api_key = get("OPENAI_API_KEY");
        let anthropic_api_key = get("ANTHROPIC_API_KEY");
        let has_provider_key =
            google_api_key.is_some() || openai_api_key.is_some() || anthropic_api_key.is_some();

        // The Vertex toggle only disables generation when no provider key
        // could take over.
        let summary_strategy = match get("SUMMARY_STRATEGY") {
            Some(v) => v.parse().unwrap_or_else(|e| {
                tracing::warn!("{}; using auto", e);
                SummaryStrategy::Auto
            }),
            None if !has_provider_key && flag("USE_VERTEX_SUMMARY") == Some(false) => {
                SummaryStrategy::Extractive
            }
            None => SummaryStrategy::Auto,
        };

        let annotator = get("ANNOTATOR")
            .map(|v| {
                v.parse().unwrap_or_else(|e| {
                    tracing::warn!("{}; using auto", e);
                    AnnotatorChoice::Auto
                })
            })
            .unwrap_or_default();

        let llm = LlmSettings {
            preferred_provider: get("LLM_PROVIDER")
                .map(|p| p.trim().to_lowercase())
                .unwrap_or(defaults.llm.preferred_provider),
            gemini_api_key: google_api_key.clone(),
            openai_api_key,
            anthropic_api_key,
            gemini_model: get("MODEL_GEMINI").unwrap_or(defaults.llm.gemini_model),
            openai_model: get("OPENAI_MODEL").unwrap_or(defaults.llm.openai_model),
            anthropic_model: get("ANTHROPIC_MODEL").unwrap_or(defaults.llm.anthropic_model),
        };

        Self {
            project_id: get("GOOGLE_CLOUD_PROJECT").unwrap_or(defaults.project_id),
            region: get("GCP_REGION").unwrap_or(defaults.region),
            gcs_bucket: get("GCS_BUCKET").unwrap_or(defaults.gcs_bucket),
            dataset_path: get("DATASET_PATH").unwrap_or(defaults.dataset_path),
            gcs_access_token: get("GCS_ACCESS_TOKEN"),
            text_col: get("TEXT_COL").unwrap_or(defaults.text_col),
            output_dir: get("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            summary_strategy,
            summary_max_words: number("SUMMARY_MAX_WORDS", defaults.summary_max_words),
            answer_max_words: number("ANSWER_MAX_WORDS", defaults.answer_max_words),
            google_api_key,
            annotator,
            llm,
            use_memory: flag("USE_MEMORY").unwrap_or(defaults.use_memory),
            memory_dir: get("MEMORY_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.memory_dir),
            embedding_dim: number("EMBEDDING_DIM", defaults.embedding_dim).max(1),
            run_log_db: get("RUN_LOG_DB")
                .map(PathBuf::from)
                .unwrap_or(defaults.run_log_db),
            run_log_table: get("RUN_LOG_TABLE").unwrap_or(defaults.run_log_table),
        }
    }
}
