use serde::Serialize;

use crate::domain::mention::Polarity;

/// Aggregated stats for one word, emotion, or entity. Buckets are transient:
/// rebuilt wholesale on every aggregation pass, never persisted.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct KeywordBucket {
    pub key: String,
    pub count: usize,
    pub sentiment_sum: f64,
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

impl KeywordBucket {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            count: 0,
            sentiment_sum: 0.0,
            positive: 0,
            negative: 0,
            neutral: 0,
        }
    }

    /// Folds one record into the bucket.
    pub fn record(&mut self, sentiment: f64, polarity: Polarity) {
        self.count += 1;
        self.sentiment_sum += sentiment;
        match polarity {
            Polarity::Positive => self.positive += 1,
            Polarity::Negative => self.negative += 1,
            Polarity::Neutral => self.neutral += 1,
        }
    }

    /// Arithmetic mean of the contributing scores. Empty buckets are never
    /// emitted, but the guard keeps the division total.
    pub fn average_sentiment(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sentiment_sum / self.count as f64
        }
    }
}

/// Order-independent composite key for an entity pair: (A, B) and (B, A)
/// address the same bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    first: String,
    second: String,
}

impl PairKey {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }
}

/// Co-occurrence stats for one entity pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PairBucket {
    pub key: PairKey,
    pub count: usize,
    pub sentiment_sum: f64,
}

impl PairBucket {
    pub fn new(key: PairKey) -> Self {
        Self {
            key,
            count: 0,
            sentiment_sum: 0.0,
        }
    }

    pub fn record(&mut self, sentiment: f64) {
        self.count += 1;
        self.sentiment_sum += sentiment;
    }

    pub fn average_sentiment(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sentiment_sum / self.count as f64
        }
    }
}
