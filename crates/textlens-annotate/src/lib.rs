//! Entity and sentiment annotation.
//!
//! [`Annotator`] is the seam between orchestration and whatever produces
//! annotations: the Cloud Natural Language REST API, the offline heuristics
//! from `textlens-ingest`, or a stand-in that always fails when the
//! configuration asks for a service it cannot reach.

pub mod cloud;
pub mod heuristic;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;
use textlens_core::{AnnotatorChoice, Error, Result, Settings};
use tracing::{debug, warn};

pub use cloud::CloudLanguageAnnotator;
pub use heuristic::HeuristicAnnotator;
pub use types::{Entity, Sentiment};

/// Produces entities and document sentiment for a text.
#[async_trait]
pub trait Annotator: Send + Sync {
    async fn entities(&self, text: &str) -> Result<Vec<Entity>>;

    async fn sentiment(&self, text: &str) -> Result<Sentiment>;

    /// Human-readable name for logs.
    fn name(&self) -> &'static str;
}

/// Annotator that fails every call with the same reason.
pub struct UnavailableAnnotator {
    reason: String,
}

impl UnavailableAnnotator {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Annotator for UnavailableAnnotator {
    async fn entities(&self, _text: &str) -> Result<Vec<Entity>> {
        Err(Error::Config(self.reason.clone()))
    }

    async fn sentiment(&self, _text: &str) -> Result<Sentiment> {
        Err(Error::Config(self.reason.clone()))
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}

/// Pick an annotator for the configured choice.
///
/// `auto` prefers the cloud service when an API key is present and the
/// heuristics otherwise. `cloud` without a key yields an annotator whose
/// calls fail, so every row carries an error marker instead of silently
/// switching backends.
pub fn create_annotator(settings: &Settings) -> Arc<dyn Annotator> {
    let key = settings.google_api_key.clone();
    let annotator: Arc<dyn Annotator> = match (settings.annotator, key) {
        (AnnotatorChoice::Heuristic, _) | (AnnotatorChoice::Auto, None) => {
            Arc::new(HeuristicAnnotator::default())
        }
        (AnnotatorChoice::Auto | AnnotatorChoice::Cloud, Some(key)) => {
            Arc::new(CloudLanguageAnnotator::new(key))
        }
        (AnnotatorChoice::Cloud, None) => {
            warn!("ANNOTATOR=cloud but GOOGLE_API_KEY is not set; annotations will carry errors");
            Arc::new(UnavailableAnnotator::new(
                "Cloud Natural Language requires GOOGLE_API_KEY",
            ))
        }
    };
    debug!("Using {} annotator", annotator.name());
    annotator
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection() {
        let mut settings = Settings::default();
        assert_eq!(create_annotator(&settings).name(), "heuristic");

        settings.google_api_key = Some("key".into());
        assert_eq!(create_annotator(&settings).name(), "cloud");

        settings.annotator = AnnotatorChoice::Heuristic;
        assert_eq!(create_annotator(&settings).name(), "heuristic");

        settings.annotator = AnnotatorChoice::Cloud;
        settings.google_api_key = None;
        assert_eq!(create_annotator(&settings).name(), "unavailable");
    }

    #[tokio::test]
    async fn test_unavailable_always_fails() {
        let a = UnavailableAnnotator::new("no key");
        let err = a.entities("text").await.unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: no key");
        assert!(a.sentiment("text").await.is_err());
    }
}
