//! Offline annotator built on the ingest heuristics.

use async_trait::async_trait;
use textlens_core::Result;
use textlens_ingest::extract::{extract_entities, score_sentiment};

use crate::types::{Entity, Sentiment};
use crate::Annotator;

/// Regex entities and lexicon sentiment; never calls the network.
pub struct HeuristicAnnotator {
    max_entities: usize,
}

impl Default for HeuristicAnnotator {
    fn default() -> Self {
        Self { max_entities: 10 }
    }
}

impl HeuristicAnnotator {
    pub fn new(max_entities: usize) -> Self {
        Self { max_entities }
    }
}

#[async_trait]
impl Annotator for HeuristicAnnotator {
    /// Salience is each entity's share of all mentions found.
    async fn entities(&self, text: &str) -> Result<Vec<Entity>> {
        let mentions = extract_entities(text, self.max_entities);
        let total: usize = mentions.iter().map(|m| m.mentions).sum();
        Ok(mentions
            .into_iter()
            .map(|m| {
                let salience = m.mentions as f64 / total.max(1) as f64;
                Entity::new(m.name, m.kind.as_str(), salience)
            })
            .collect())
    }

    async fn sentiment(&self, text: &str) -> Result<Sentiment> {
        let s = score_sentiment(text);
        Ok(Sentiment::new(s.score, s.magnitude))
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_entities_with_salience() {
        let a = HeuristicAnnotator::default();
        let entities = a
            .entities("I like the Pixel. The Pixel camera beats the Galaxy. Pixel wins.")
            .await
            .unwrap();
        assert_eq!(entities[0], Entity::new("Pixel", "OTHER", 0.75));
        assert_eq!(entities[1], Entity::new("Galaxy", "OTHER", 0.25));
    }

    #[tokio::test]
    async fn test_sentiment() {
        let a = HeuristicAnnotator::new(5);
        let s = a.sentiment("Terrible battery, awful support.").await.unwrap();
        assert_eq!(s, Sentiment::new(-1.0, 2.0));
    }
}
