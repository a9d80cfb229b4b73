use ordered_float::OrderedFloat;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::domain::bucket::KeywordBucket;
use crate::domain::lexicon::StopWords;
use crate::domain::mention::{Mention, POLARITY_THRESHOLD};

const MIN_TOKEN_LEN: usize = 3;
const TOP_THEME_MIN_COUNT: usize = 5;
const TOP_THEME_LIMIT: usize = 30;
const POLARITY_MIN_COUNT: usize = 3;
const POLARITY_LIMIT: usize = 10;
const TREND_LIMIT: usize = 5;

/// Extracts ranked "theme" words from mention text, with per-word sentiment
/// aggregates. Stateless: every call rebuilds its buckets from scratch.
#[derive(Debug, Clone, Default)]
pub struct ThemeExtractor {
    stop_words: StopWords,
}

/// One headline trend row, shaped for the dashboard summary card.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrendRow {
    pub term: String,
    pub frequency: usize,
    pub sentiment_score: String,
    pub description: String,
}

impl ThemeExtractor {
    pub fn new(stop_words: StopWords) -> Self {
        Self { stop_words }
    }

    /// Counts words across all records, in first-seen order.
    ///
    /// Counting is record-level presence: a word contributes once per record
    /// that contains it, however often it repeats within that record, and
    /// the record's sentiment is added once. Raw token occurrences are not
    /// what the dashboards chart.
    pub fn count_word_frequency(&self, records: &[Mention]) -> Vec<KeywordBucket> {
        let mut buckets: Vec<KeywordBucket> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut skipped = 0usize;

        for record in records {
            let Some(text) = record.content() else {
                skipped += 1;
                continue;
            };
            let sentiment = record.resolved_sentiment();
            let polarity = record.polarity();
            let mut seen: HashSet<String> = HashSet::new();
            for token in self.tokenize(text) {
                if !seen.insert(token.clone()) {
                    continue;
                }
                let slot = *index.entry(token.clone()).or_insert_with(|| {
                    buckets.push(KeywordBucket::new(token));
                    buckets.len() - 1
                });
                buckets[slot].record(sentiment, polarity);
            }
        }

        debug!(
            words = buckets.len(),
            skipped, "word frequency pass complete"
        );
        buckets
    }

    /// Buckets with `count >= min_count`, sorted by count descending
    /// (stable, so ties keep first-seen order), truncated to `top_n`.
    pub fn ranked(&self, records: &[Mention], min_count: usize, top_n: usize) -> Vec<KeywordBucket> {
        let mut buckets: Vec<KeywordBucket> = self
            .count_word_frequency(records)
            .into_iter()
            .filter(|b| b.count >= min_count)
            .collect();
        buckets.sort_by(|a, b| b.count.cmp(&a.count));
        buckets.truncate(top_n);
        buckets
    }

    pub fn top_themes(&self, records: &[Mention]) -> Vec<KeywordBucket> {
        self.ranked(records, TOP_THEME_MIN_COUNT, TOP_THEME_LIMIT)
    }

    pub fn positive_themes(&self, records: &[Mention]) -> Vec<KeywordBucket> {
        self.polarity_themes(records, true)
    }

    pub fn negative_themes(&self, records: &[Mention]) -> Vec<KeywordBucket> {
        self.polarity_themes(records, false)
    }

    fn polarity_themes(&self, records: &[Mention], positive: bool) -> Vec<KeywordBucket> {
        let mut buckets: Vec<KeywordBucket> = self
            .count_word_frequency(records)
            .into_iter()
            .filter(|b| b.count >= POLARITY_MIN_COUNT)
            .filter(|b| {
                let avg = b.average_sentiment();
                if positive { avg > 0.0 } else { avg < 0.0 }
            })
            .collect();
        buckets.sort_by_key(|b| {
            let avg = OrderedFloat(b.average_sentiment());
            if positive { -avg } else { avg }
        });
        buckets.truncate(POLARITY_LIMIT);
        buckets
    }

    /// Top five terms by frequency, formatted for the headline summary card.
    pub fn key_trends(&self, records: &[Mention]) -> Vec<TrendRow> {
        self.ranked(records, 1, TREND_LIMIT)
            .into_iter()
            .map(|bucket| {
                let avg = bucket.average_sentiment();
                TrendRow {
                    description: trend_description(&bucket.key, avg),
                    term: bucket.key,
                    frequency: bucket.count,
                    sentiment_score: format!("{avg:.2}"),
                }
            })
            .collect()
    }

    /// Lowercases, strips non-alphanumeric characters, splits on whitespace,
    /// and drops short tokens and stop words.
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { ' ' })
            .collect::<String>()
            .split_whitespace()
            .filter(|t| t.chars().count() >= MIN_TOKEN_LEN && !self.stop_words.contains(t))
            .map(|t| t.to_string())
            .collect()
    }
}

fn trend_description(term: &str, average: f64) -> String {
    if average > POLARITY_THRESHOLD {
        format!("Conversations around \"{term}\" are strongly positive")
    } else if average < -POLARITY_THRESHOLD {
        format!("\"{term}\" is drawing negative reactions")
    } else {
        format!("Mixed sentiment around \"{term}\"")
    }
}
