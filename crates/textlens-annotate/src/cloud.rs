//! Cloud Natural Language v2 REST annotator.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use textlens_core::{Error, Result};
use tracing::debug;

use crate::types::{Entity, Sentiment};
use crate::Annotator;

const LANGUAGE_BASE: &str = "https://language.googleapis.com/v2/documents";

/// Calls `documents:analyzeEntities` and `documents:analyzeSentiment`
/// with an API key.
pub struct CloudLanguageAnnotator {
    client: Client,
    api_key: String,
    base_url: String,
}

impl CloudLanguageAnnotator {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, LANGUAGE_BASE)
    }

    /// Point the annotator at another endpoint (a proxy or a test server).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    async fn call(&self, method: &str, text: &str) -> Result<Value> {
        let url = format!("{}:{}", self.base_url, method);
        let body = json!({
            "document": {"type": "PLAIN_TEXT", "content": text},
            "encodingType": "UTF8",
        });
        debug!("POST {} ({} chars)", url, text.len());

        let resp = self
            .client
            .post(&url)
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Annotation(format!("{} request failed: {}", method, e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Annotation(format!(
                "{} returned {}: {}",
                method, status, body
            )));
        }

        resp.json::<Value>()
            .await
            .map_err(|e| Error::Annotation(format!("{} returned malformed JSON: {}", method, e)))
    }
}

#[async_trait]
impl Annotator for CloudLanguageAnnotator {
    async fn entities(&self, text: &str) -> Result<Vec<Entity>> {
        let resp = self.call("analyzeEntities", text).await?;
        Ok(parse_entities(&resp))
    }

    async fn sentiment(&self, text: &str) -> Result<Sentiment> {
        let resp = self.call("analyzeSentiment", text).await?;
        parse_sentiment(&resp)
    }

    fn name(&self) -> &'static str {
        "cloud"
    }
}

/// Entities from an `analyzeEntities` response. Missing salience reads as
/// 0 and a missing type as `UNKNOWN`.
pub fn parse_entities(resp: &Value) -> Vec<Entity> {
    resp["entities"]
        .as_array()
        .map(|entities| {
            entities
                .iter()
                .map(|e| {
                    Entity::new(
                        e["name"].as_str().unwrap_or_default(),
                        e["type"].as_str().unwrap_or("UNKNOWN"),
                        e["salience"].as_f64().unwrap_or(0.0),
                    )
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Document sentiment from an `analyzeSentiment` response.
pub fn parse_sentiment(resp: &Value) -> Result<Sentiment> {
    let doc = &resp["documentSentiment"];
    if !doc.is_object() {
        return Err(Error::Annotation(
            "analyzeSentiment response has no documentSentiment".into(),
        ));
    }
    // Zero values are omitted from the JSON encoding.
    Ok(Sentiment::new(
        doc["score"].as_f64().unwrap_or(0.0),
        doc["magnitude"].as_f64().unwrap_or(0.0),
    ))
}
