//! Text generation behind a trait, so orchestration can run against fakes.

use async_trait::async_trait;
use reqwest::Client;
use textlens_core::{Error, Result};
use tokio_stream::StreamExt;
use tracing::debug;

use crate::config::GeneratorConfig;
use crate::providers::{stream_llm, StreamChunk};
use crate::types::{GenerationRequest, LlmProvider};

/// Something that turns a prompt into text.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a complete response for `request`.
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Human-readable name for logs.
    fn name(&self) -> String;
}

/// Generator backed by one of the streaming LLM providers.
pub struct LlmGenerator {
    client: Client,
    provider: LlmProvider,
    model: String,
    api_key: String,
}

impl LlmGenerator {
    /// Build a generator for the resolved provider, or `None` when no
    /// provider has a key.
    pub fn from_config(config: &GeneratorConfig) -> Option<Self> {
        let (provider, model, api_key) = config.resolve_provider()?;
        Some(Self {
            client: Client::new(),
            provider,
            model,
            api_key,
        })
    }

    pub fn provider(&self) -> LlmProvider {
        self.provider
    }
}

#[async_trait]
impl Generator for LlmGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let mut stream = stream_llm(
            &self.client,
            self.provider,
            request,
            &self.model,
            &self.api_key,
        );

        let mut full = String::new();
        while let Some(chunk) = stream.next().await {
            match chunk {
                StreamChunk::Token(t) => full.push_str(&t),
                StreamChunk::Done { tokens_used } => {
                    debug!("{} finished after {} chunks", self.name(), tokens_used);
                    break;
                }
                StreamChunk::Error(e) => {
                    return Err(Error::Generation(format!("{}: {}", self.provider, e)));
                }
            }
        }
        Ok(full)
    }

    fn name(&self) -> String {
        format!("{}/{}", self.provider, self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use textlens_core::LlmSettings;

    #[test]
    fn test_no_key_means_no_generator() {
        let config = GeneratorConfig::from_settings(&LlmSettings::default());
        assert!(LlmGenerator::from_config(&config).is_none());
    }

    #[test]
    fn test_generator_uses_resolved_provider() {
        let llm = LlmSettings {
            anthropic_api_key: Some("key".into()),
            ..LlmSettings::default()
        };
        let generator = LlmGenerator::from_config(&GeneratorConfig::from_settings(&llm)).unwrap();
        assert_eq!(generator.provider(), LlmProvider::Anthropic);
        assert_eq!(generator.name(), "anthropic/claude-3-5-haiku-20241022");
    }
}
