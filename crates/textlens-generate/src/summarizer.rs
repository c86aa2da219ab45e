//! Summarization capability with a generative and an extractive strategy.
//!
//! Generation is attempted only when the configured strategy allows it and
//! a generator exists. Every failure of the generative path falls through to
//! the extractive summarizer with the same word budget, so [`Summarizer::summarize`]
//! always returns a string.

use std::sync::Arc;

use textlens_core::SummaryStrategy;
use textlens_ingest::extract::summary::{draft_summary, summarize, truncate_words};
use tracing::{debug, warn};

use crate::generator::Generator;
use crate::types::GenerationRequest;

/// Prompt sent to the model for a budgeted one-sentence summary.
pub fn format_prompt(text: &str, context: Option<&str>, max_words: usize) -> String {
    format!(
        "Summarize the text faithfully in at most {} words. Use one sentence. \
         Do not exceed the word limit. Do not use ellipses.\nContext: {}\nText: {}",
        max_words,
        context.unwrap_or(""),
        text
    )
}

pub struct Summarizer {
    generator: Option<Arc<dyn Generator>>,
}

impl Summarizer {
    /// Combine a strategy with an optional generator.
    pub fn new(strategy: SummaryStrategy, generator: Option<Arc<dyn Generator>>) -> Self {
        let generator = match strategy {
            SummaryStrategy::Extractive => None,
            SummaryStrategy::Auto => generator,
            SummaryStrategy::Generative => {
                if generator.is_none() {
                    warn!("Generative summaries requested but no model provider is configured; using extractive summaries");
                }
                generator
            }
        };
        if let Some(g) = &generator {
            debug!("Summaries will be generated with {}", g.name());
        }
        Self { generator }
    }

    /// A summarizer that never calls a model.
    pub fn extractive() -> Self {
        Self { generator: None }
    }

    /// Whether summaries go through the generator first.
    pub fn is_generative(&self) -> bool {
        self.generator.is_some()
    }

    /// Summarize `text` in at most `max_words` words.
    pub async fn summarize(&self, text: &str, context: Option<&str>, max_words: usize) -> String {
        let Some(generator) = &self.generator else {
            return summarize(text, max_words);
        };

        let request = GenerationRequest::prompt(format_prompt(text, context, max_words));
        match generator.generate(&request).await {
            Ok(out) => {
                let out = out.trim();
                if out.is_empty() {
                    debug!("{} returned nothing, using extractive draft", generator.name());
                    truncate_words(&draft_summary(text), max_words)
                } else {
                    truncate_words(out, max_words)
                }
            }
            Err(e) => {
                warn!("Generative summary failed, using extractive: {}", e);
                summarize(text, max_words)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use textlens_core::{Error, Result};

    struct FakeGenerator {
        reply: Result<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl FakeGenerator {
        fn replying(reply: Result<String>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Generator for FakeGenerator {
        async fn generate(&self, request: &GenerationRequest) -> Result<String> {
            self.prompts.lock().push(request.messages[0].content.clone());
            match &self.reply {
                Ok(s) => Ok(s.clone()),
                Err(e) => Err(Error::Generation(e.to_string())),
            }
        }

        fn name(&self) -> String {
            "fake".into()
        }
    }

    const TEXT: &str = "The cat sat. The cat sat on the mat. Dogs bark loudly at night.";

    #[test]
    fn test_prompt_format() {
        assert_eq!(
            format_prompt("body", Some("User query: cats"), 10),
            "Summarize the text faithfully in at most 10 words. Use one sentence. \
             Do not exceed the word limit. Do not use ellipses.\nContext: User query: cats\nText: body"
        );
        assert!(format_prompt("body", None, 5).contains("\nContext: \nText: body"));
    }

    #[tokio::test]
    async fn test_generated_summary_is_truncated() {
        let fake = FakeGenerator::replying(Ok("  A cat sat on a mat while dogs barked … ".into()));
        let s = Summarizer::new(SummaryStrategy::Auto, Some(fake.clone() as Arc<dyn Generator>));
        assert_eq!(s.summarize(TEXT, Some("ctx"), 4).await, "A cat sat on");
        assert_eq!(fake.prompts.lock().len(), 1);
        assert!(fake.prompts.lock()[0].contains("at most 4 words"));
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_extractive() {
        let fake = FakeGenerator::replying(Err(Error::Http("quota".into())));
        let s = Summarizer::new(SummaryStrategy::Generative, Some(fake as Arc<dyn Generator>));
        assert_eq!(s.summarize(TEXT, None, 6).await, "The cat sat. The cat sat");
    }

    #[tokio::test]
    async fn test_empty_reply_falls_back_to_extractive() {
        let fake = FakeGenerator::replying(Ok("   ".into()));
        let s = Summarizer::new(SummaryStrategy::Auto, Some(fake as Arc<dyn Generator>));
        assert_eq!(s.summarize(TEXT, None, 6).await, "The cat sat. The cat sat");
    }

    #[tokio::test]
    async fn test_extractive_strategy_skips_generator() {
        let fake = FakeGenerator::replying(Ok("generated".into()));
        let s = Summarizer::new(SummaryStrategy::Extractive, Some(fake.clone() as Arc<dyn Generator>));
        assert!(!s.is_generative());
        assert_eq!(s.summarize(TEXT, None, 6).await, "The cat sat. The cat sat");
        assert!(fake.prompts.lock().is_empty());
    }

    #[tokio::test]
    async fn test_zero_budget_is_empty() {
        let fake = FakeGenerator::replying(Ok("generated text".into()));
        let s = Summarizer::new(SummaryStrategy::Auto, Some(fake as Arc<dyn Generator>));
        assert_eq!(s.summarize(TEXT, None, 0).await, "");
        assert_eq!(Summarizer::extractive().summarize(TEXT, None, 0).await, "");
    }
}
