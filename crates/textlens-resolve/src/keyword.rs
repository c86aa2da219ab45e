//! Keyword-overlap retriever.

use regex::{Regex, RegexBuilder};
use textlens_core::{Record, ScoredRecord};
use tracing::{debug, warn};

/// Ranks records by how often query tokens occur in their text.
pub struct KeywordRetriever;

impl KeywordRetriever {
    /// Top `k` records for `query`, highest score first.
    ///
    /// A record's score is the number of non-overlapping, case-insensitive
    /// matches of any query token in its text; each token is matched
    /// literally. Equal scores keep input order. A query without tokens
    /// scores every record 0, so the first `k` records come back unchanged.
    pub fn retrieve(records: &[Record], query: &str, k: usize) -> Vec<ScoredRecord> {
        let pattern = Self::build_pattern(query);

        let mut scored: Vec<ScoredRecord> = records
            .iter()
            .map(|record| ScoredRecord {
                record: record.clone(),
                score: pattern
                    .as_ref()
                    .map(|re| re.find_iter(&record.text.to_lowercase()).count())
                    .unwrap_or(0),
            })
            .collect();

        // `sort_by` is stable, so ties stay in input order.
        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored.truncate(k);
        debug!(
            "Keyword retrieval over {} records returned {} (query={:?})",
            records.len(),
            scored.len(),
            query
        );
        scored
    }

    /// Alternation of the escaped lowercase query tokens, or `None` when
    /// the query has no tokens.
    fn build_pattern(query: &str) -> Option<Regex> {
        let lower = query.to_lowercase();
        let tokens: Vec<String> = lower.split_whitespace().map(regex::escape).collect();
        if tokens.is_empty() {
            return None;
        }
        match RegexBuilder::new(&tokens.join("|"))
            .case_insensitive(true)
            .build()
        {
            Ok(re) => Some(re),
            Err(e) => {
                warn!("Query pattern rejected, scoring all records 0: {}", e);
                None
            }
        }
    }
}
