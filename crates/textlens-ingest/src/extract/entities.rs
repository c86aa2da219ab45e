//! Heuristic entity extraction.
//!
//! Finds proper-noun runs, organizations, dates, numbers, technical terms
//! and quoted terms with regex patterns. Used by the offline annotator when
//! no language service is configured.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::sentences::split_sentences;

/// Coarse entity type, named like the language service's types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Person,
    Organization,
    Date,
    Number,
    Other,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "PERSON",
            Self::Organization => "ORGANIZATION",
            Self::Date => "DATE",
            Self::Number => "NUMBER",
            Self::Other => "OTHER",
        }
    }
}

/// One distinct entity and how often it occurs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMention {
    pub name: String,
    pub kind: EntityKind,
    pub mentions: usize,
}

static TITLE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:Mr|Mrs|Ms|Dr|Prof)\.\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)").unwrap()
});

const TITLES: [&str; 5] = ["Mr", "Mrs", "Ms", "Dr", "Prof"];

static ORGANIZATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Z][A-Za-z]+(?:\s+[A-Z][A-Za-z]+)*\s+(?:Inc\.?|Corp\.?|LLC|Ltd\.?|Co\.)").unwrap()
});

static DATES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\b(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2}(?:st|nd|rd|th)?,?\s*\d{4}\b",
        r"\b(?:Jan|Feb|Mar|Apr|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\.?\s+\d{1,2}(?:st|nd|rd|th)?,?\s*\d{4}\b",
        r"\b\d{1,2}[-/]\d{1,2}[-/]\d{2,4}\b",
        r"\b\d{4}-\d{1,2}-\d{1,2}\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$?\b\d+(?:[.,]\d+)*(?:%|\b)").unwrap());

static TECHNICAL: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\b[a-z]+[A-Z][a-zA-Z]*\b",
        r"\b[a-z]+_[a-z_]+\b",
        r"\b[A-Z][A-Z_]{2,}\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]{2,30})""#).unwrap());

/// Extract up to `max_entities` entities, most frequent first.
///
/// Ties keep first-seen order so repeated runs produce the same list.
pub fn extract_entities(text: &str, max_entities: usize) -> Vec<EntityMention> {
    let mut found: Vec<(String, EntityKind)> = Vec::new();
    let mut add = |name: &str, kind: EntityKind| {
        let name = name.trim();
        // Parts of an already-found entity are not entities of their own.
        if name.len() < 2 || found.iter().any(|(n, _)| n.contains(name)) {
            return;
        }
        found.push((name.to_string(), kind));
    };

    for m in ORGANIZATION.find_iter(text) {
        add(m.as_str(), EntityKind::Organization);
    }
    for cap in TITLE_NAME.captures_iter(text) {
        if let Some(m) = cap.get(1) {
            add(m.as_str(), EntityKind::Person);
        }
    }
    for re in DATES.iter() {
        for m in re.find_iter(text) {
            add(m.as_str(), EntityKind::Date);
        }
    }

    // Runs of capitalized words, skipping the sentence-initial word.
    for sentence in split_sentences(text) {
        let words: Vec<&str> = sentence.split_whitespace().collect();
        let mut run: Vec<String> = Vec::new();
        for (i, word) in words.iter().enumerate() {
            let cleaned: String = word.chars().filter(|c| c.is_alphanumeric()).collect();
            let capitalized = i > 0
                && cleaned.chars().count() > 1
                && !TITLES.contains(&cleaned.as_str())
                && cleaned.chars().next().is_some_and(char::is_uppercase)
                && !cleaned.chars().all(char::is_uppercase);
            if capitalized {
                run.push(cleaned);
                // Punctuation after a word ends the run.
                if !word.ends_with(|c: char| c.is_alphanumeric()) {
                    flush_run(&mut run, &mut add);
                }
            } else {
                flush_run(&mut run, &mut add);
            }
        }
        flush_run(&mut run, &mut add);
    }

    for re in TECHNICAL.iter() {
        for m in re.find_iter(text) {
            add(m.as_str(), EntityKind::Other);
        }
    }
    for cap in QUOTED.captures_iter(text) {
        if let Some(m) = cap.get(1) {
            add(m.as_str(), EntityKind::Other);
        }
    }
    for m in NUMBER.find_iter(text) {
        add(m.as_str(), EntityKind::Number);
    }

    let lower = text.to_lowercase();
    let mut mentions: Vec<EntityMention> = found
        .into_iter()
        .map(|(name, kind)| {
            let count = lower.matches(&name.to_lowercase()).count().max(1);
            EntityMention {
                name,
                kind,
                mentions: count,
            }
        })
        .collect();
    mentions.sort_by(|a, b| b.mentions.cmp(&a.mentions));
    mentions.truncate(max_entities);
    mentions
}

/// Two or more capitalized words read as a name; a single one is generic.
fn flush_run(run: &mut Vec<String>, add: &mut impl FnMut(&str, EntityKind)) {
    match run.len() {
        0 => {}
        1 => add(&run[0], EntityKind::Other),
        _ => add(&run.join(" "), EntityKind::Person),
    }
    run.clear();
}
