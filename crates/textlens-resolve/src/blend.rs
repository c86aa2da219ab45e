//! Candidate blending: keyword hits first, memory hits after, deduplicated.

use std::collections::HashSet;

use textlens_core::ScoredRecord;

use crate::types::Candidate;

/// Drop empty texts and exact-duplicate texts (later copies lose), then keep
/// the first `k`.
pub fn dedup_by_text(candidates: Vec<Candidate>, k: usize) -> Vec<Candidate> {
    let mut seen: HashSet<String> = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| !c.text.is_empty() && seen.insert(c.text.clone()))
        .take(k)
        .collect()
}

/// Append memory hits after the keyword hits and deduplicate to `k`.
///
/// Memory only widens the pool: a keyword hit is never displaced by a
/// memory hit with the same text.
pub fn blend_candidates(
    keyword: Vec<ScoredRecord>,
    memory: Vec<Candidate>,
    k: usize,
) -> Vec<Candidate> {
    let pool: Vec<Candidate> = keyword
        .into_iter()
        .map(Candidate::from)
        .chain(memory)
        .collect();
    dedup_by_text(pool, k)
}
