//! Sentiment scoring for community posts.

use std::collections::HashSet;

const NEGATION_WORDS: &[&str] = &[
    "not", "no", "never", "don't", "doesn't", "didn't", "isn't", "aren't", "wasn't", "weren't",
    "won't", "wouldn't", "couldn't", "shouldn't", "hardly", "barely", "neither", "nor", "without",
];

const NEGATION_WINDOW: usize = 3;

/// Scores a text on a -1 (very negative) to 1 (very positive) scale.
pub trait SentimentScorer: Send + Sync {
    fn score(&self, text: &str) -> f64;
}

/// Word-list scorer tuned for workplace discussions.
pub struct LexiconSentiment {
    positive_words: HashSet<&'static str>,
    negative_words: HashSet<&'static str>,
    negation_words: HashSet<&'static str>,
}

impl LexiconSentiment {
    pub fn new() -> Self {
        Self {
            positive_words: [
                "good", "great", "excellent", "supportive", "respectful", "fair", "inclusive",
                "safe", "happy", "helpful", "positive", "love", "enjoy", "recommend", "best",
                "friendly", "transparent", "accountable", "improved", "resolved", "welcoming",
                "ethical", "trust", "appreciated", "valued", "flexible", "honest",
            ]
            .into_iter()
            .collect(),
            negative_words: [
                "bad", "terrible", "awful", "toxic", "hostile", "harassment", "harassed",
                "discrimination", "discriminated", "retaliation", "retaliated", "abuse",
                "abusive", "unfair", "unsafe", "fear", "afraid", "hate", "worst", "racist",
                "sexist", "bullying", "bullied", "fired", "lawsuit", "ignored", "coverup",
                "miserable", "negative", "poor", "burnout", "scared", "gaslighting",
            ]
            .into_iter()
            .collect(),
            negation_words: NEGATION_WORDS.iter().copied().collect(),
        }
    }
}

impl Default for LexiconSentiment {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentScorer for LexiconSentiment {
    fn score(&self, text: &str) -> f64 {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '.' | '!' | '?' | ':' | '(' | ')' | '"'))
            .filter(|w| !w.is_empty())
            .collect();

        let negation_positions: Vec<usize> = words
            .iter()
            .enumerate()
            .filter(|(_, w)| self.negation_words.contains(*w))
            .map(|(i, _)| i)
            .collect();

        let mut score: i32 = 0;
        let mut hits: i32 = 0;

        for (i, word) in words.iter().enumerate() {
            let is_positive = self.positive_words.contains(*word);
            let is_negative = self.negative_words.contains(*word);
            if !is_positive && !is_negative {
                continue;
            }

            let negated = negation_positions
                .iter()
                .any(|&pos| pos < i && i - pos <= NEGATION_WINDOW);

            hits += 1;
            if is_positive {
                score += if negated { -1 } else { 1 };
            } else {
                score += if negated { 1 } else { -1 };
            }
        }

        if hits == 0 {
            0.0
        } else {
            f64::from(score) / f64::from(hits)
        }
    }
}

/// Mean score over `texts` rounded to 3 decimals, with the number of texts.
///
/// An empty input yields `(0.0, 0)`.
pub fn average_sentiment(scorer: &dyn SentimentScorer, texts: &[String]) -> (f64, usize) {
    if texts.is_empty() {
        return (0.0, 0);
    }

    let total: f64 = texts.iter().map(|t| scorer.score(t)).sum();
    let average = total / texts.len() as f64;
    ((average * 1000.0).round() / 1000.0, texts.len())
}
