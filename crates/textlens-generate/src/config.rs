//! Provider selection for generative calls.

use textlens_core::LlmSettings;
use tracing::debug;

use crate::types::LlmProvider;

/// Generator configuration derived from the process settings.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub llm: LlmSettings,
}

impl GeneratorConfig {
    pub fn from_settings(llm: &LlmSettings) -> Self {
        Self { llm: llm.clone() }
    }

    /// Resolve which provider, model and API key to use.
    ///
    /// An explicit preference only resolves when its key is present. In
    /// auto mode the order is Gemini, then Anthropic, then OpenAI.
    pub fn resolve_provider(&self) -> Option<(LlmProvider, String, String)> {
        let llm = &self.llm;
        let gemini = || {
            llm.gemini_api_key
                .as_ref()
                .map(|k| (LlmProvider::Gemini, llm.gemini_model.clone(), k.clone()))
        };
        let anthropic = || {
            llm.anthropic_api_key
                .as_ref()
                .map(|k| (LlmProvider::Anthropic, llm.anthropic_model.clone(), k.clone()))
        };
        let openai = || {
            llm.openai_api_key
                .as_ref()
                .map(|k| (LlmProvider::OpenAI, llm.openai_model.clone(), k.clone()))
        };

        let resolved = match llm.preferred_provider.as_str() {
            "auto" => gemini().or_else(anthropic).or_else(openai),
            "gemini" | "google" => gemini(),
            "anthropic" => anthropic(),
            "openai" => openai(),
            _ => None,
        };
        debug!(
            "Provider preference {:?} resolved to {:?}",
            llm.preferred_provider,
            resolved.as_ref().map(|(p, m, _)| format!("{}/{}", p, m))
        );
        resolved
    }

    /// Whether any provider resolves.
    pub fn is_available(&self) -> bool {
        self.resolve_provider().is_some()
    }
}
