//! Lexicon sentiment scoring.

use serde::{Deserialize, Serialize};

const POSITIVE: &[&str] = &[
    "amazing", "awesome", "best", "comfortable", "delightful", "easy", "excellent", "fantastic",
    "fast", "friendly", "glad", "good", "great", "happy", "helpful", "impressed", "love", "loved",
    "nice", "perfect", "pleasant", "quick", "recommend", "reliable", "satisfied", "smooth",
    "solid", "sturdy", "superb", "useful", "wonderful", "works", "worth",
];

const NEGATIVE: &[&str] = &[
    "angry", "annoying", "awful", "bad", "broke", "broken", "cheap", "confusing", "defective",
    "disappointed", "disappointing", "expensive", "fail", "failed", "faulty", "hate", "hated",
    "horrible", "poor", "problem", "refund", "return", "rude", "slow", "terrible", "useless",
    "waste", "worse", "worst", "wrong",
];

const NEGATORS: &[&str] = &["not", "no", "never", "hardly", "isn't", "wasn't", "don't", "doesn't", "didn't", "can't", "won't"];

const INTENSIFIERS: &[&str] = &["very", "really", "extremely", "super", "so", "absolutely"];

/// Document sentiment: `score` in `[-1, 1]`, `magnitude` the total
/// absolute polarity found.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SentimentScore {
    pub score: f64,
    pub magnitude: f64,
}

/// Score `text` against the built-in lexicon.
///
/// A negator flips the polarity of the next two words; an intensifier
/// boosts the next word by half.
pub fn score_sentiment(text: &str) -> SentimentScore {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
        .collect();

    let mut total = 0.0;
    let mut magnitude = 0.0;
    let mut hits = 0usize;
    let mut negate_left = 0usize;
    let mut boost = 1.0;

    for word in words {
        if NEGATORS.contains(&word) {
            negate_left = 2;
            continue;
        }
        if INTENSIFIERS.contains(&word) {
            boost = 1.5;
            continue;
        }

        let polarity = if POSITIVE.contains(&word) {
            1.0
        } else if NEGATIVE.contains(&word) {
            -1.0
        } else {
            0.0
        };

        if polarity != 0.0 {
            let mut value = polarity * boost;
            if negate_left > 0 {
                value = -value;
            }
            total += value;
            magnitude += f64::abs(value);
            hits += 1;
        }

        boost = 1.0;
        negate_left = negate_left.saturating_sub(1);
    }

    if hits == 0 {
        return SentimentScore::default();
    }
    SentimentScore {
        score: (total / magnitude.max(1.0)).clamp(-1.0, 1.0),
        magnitude,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_review() {
        let s = score_sentiment("Great phone, I love it. Battery is excellent.");
        assert_eq!(s.score, 1.0);
        assert_eq!(s.magnitude, 3.0);
    }

    #[test]
    fn test_negation_flips() {
        let s = score_sentiment("The screen is not good.");
        assert!(s.score < 0.0);
    }

    #[test]
    fn test_mixed_review_is_between() {
        let s = score_sentiment("Fast shipping but the case was broken and support was rude.");
        assert!(s.score < 0.0 && s.score > -1.0);
        assert_eq!(s.magnitude, 3.0);
    }

    #[test]
    fn test_neutral_text() {
        assert_eq!(score_sentiment("The box arrived on Tuesday."), SentimentScore::default());
        assert_eq!(score_sentiment(""), SentimentScore::default());
    }

    #[test]
    fn test_intensifier_raises_magnitude() {
        let plain = score_sentiment("it was bad");
        let strong = score_sentiment("it was very bad");
        assert!(strong.magnitude > plain.magnitude);
        assert_eq!(strong.score, -1.0);
    }
}
