//! Extractive summarizer.
//!
//! Picks the three densest sentences by normalized term frequency, restores
//! their document order, and caps the result to a word budget. No model or
//! network is involved, so the summarizer is always available as the last
//! fallback of the generative path.

use std::collections::HashMap;

use super::sentences::split_sentences;

/// Chunk size (in characters) used when the text has no usable sentences.
const CHUNK_CHARS: usize = 200;
/// Raw-text prefix (in characters) used when no draft could be built.
const FALLBACK_CHARS: usize = 240;
/// Sentences kept in a draft summary.
const TOP_SENTENCES: usize = 3;

const ELLIPSIS_TOKENS: [&str; 3] = ["...", "..", "…"];

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "if", "to", "of", "in", "on", "for", "with", "as", "by",
    "at", "is", "it", "this", "that", "was", "were", "are", "be", "have", "has", "had", "i", "you",
    "he", "she", "they", "we", "my", "our", "your", "their",
];

/// Summarize `text` in at most `max_words` whitespace-delimited words.
pub fn summarize(text: &str, max_words: usize) -> String {
    truncate_words(&draft_summary(text), max_words)
}

/// Top sentences in document order, or a raw prefix for degenerate input.
pub fn draft_summary(text: &str) -> String {
    let units = segment(text);
    if units.is_empty() {
        return prefix_chars(text, FALLBACK_CHARS).to_string();
    }

    let scores = score_sentences(&units);
    let k = TOP_SENTENCES.min(units.len());

    // Stable sort keeps earlier sentences first among equal scores.
    let mut ranked: Vec<usize> = (0..units.len()).collect();
    ranked.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut chosen = ranked[..k].to_vec();
    chosen.sort_unstable();

    let draft = chosen
        .iter()
        .map(|&i| units[i])
        .collect::<Vec<_>>()
        .join(" ");
    let draft = draft.trim();
    if draft.is_empty() {
        prefix_chars(text, FALLBACK_CHARS).to_string()
    } else {
        draft.to_string()
    }
}

/// Sentences, or fixed-size character chunks when punctuation yields at
/// most one sentence.
fn segment(text: &str) -> Vec<&str> {
    let sentences = split_sentences(text);
    if sentences.len() > 1 {
        return sentences;
    }
    chunk_chars(text, CHUNK_CHARS)
        .into_iter()
        .filter(|c| !c.trim().is_empty())
        .collect()
}

fn chunk_chars(text: &str, size: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    for (count, (i, _)) in text.char_indices().enumerate() {
        if count > 0 && count % size == 0 {
            chunks.push(&text[start..i]);
            start = i;
        }
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }
    chunks
}

fn prefix_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}

/// Lowercased `\w+` runs.
fn word_tokens(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

fn is_scored(token: &str) -> bool {
    !STOPWORDS.contains(&token) && !token.chars().all(char::is_numeric)
}

/// Normalized term weights: every count divided by the highest count.
fn word_frequencies(sentences: &[&str]) -> HashMap<String, f64> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for s in sentences {
        for w in word_tokens(s).filter(|w| is_scored(w)) {
            *counts.entry(w).or_insert(0) += 1;
        }
    }
    let max = counts.values().copied().max().unwrap_or(1).max(1) as f64;
    counts
        .into_iter()
        .map(|(w, c)| (w, c as f64 / max))
        .collect()
}

/// Sum of token weights over a quarter-power length penalty.
pub fn score_sentences(sentences: &[&str]) -> Vec<f64> {
    let freqs = word_frequencies(sentences);
    if freqs.is_empty() {
        return vec![0.0; sentences.len()];
    }
    sentences
        .iter()
        .map(|s| {
            let total: f64 = word_tokens(s)
                .map(|w| freqs.get(&w).copied().unwrap_or(0.0))
                .sum();
            let length = s.split_whitespace().count().max(1) as f64;
            total / length.powf(0.25)
        })
        .collect()
}

/// Cap `text` to `max_words` words without a dangling ellipsis.
///
/// Words are re-joined with single spaces. A trailing ellipsis token is
/// dropped rather than replaced, so the result may be shorter than the
/// budget. Ellipsis characters are also stripped when the text already
/// fits the budget.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    if max_words == 0 {
        return String::new();
    }
    let mut words: Vec<&str> = text.split_whitespace().take(max_words).collect();

    if words
        .last()
        .is_some_and(|last| ELLIPSIS_TOKENS.contains(last))
    {
        words.pop();
    }

    while let Some(last) = words.pop() {
        let cleaned = strip_trailing_ellipsis(last);
        if !cleaned.is_empty() {
            words.push(cleaned);
            break;
        }
    }
    words.join(" ")
}

fn strip_trailing_ellipsis(word: &str) -> &str {
    let mut w = word.trim_end_matches('…');
    if w.ends_with("..") {
        w = w.trim_end_matches('.');
    }
    // A mixed tail such as ".…." needs another pass.
    if w.len() != word.len() {
        strip_trailing_ellipsis(w)
    } else {
        w
    }
}
