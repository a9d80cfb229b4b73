use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single social-media mention as delivered by the upstream API.
///
/// Every field is optional: the feed is duck-typed and frequently sparse.
/// Accessors apply the resolution policy once so the aggregation services
/// never touch raw fields directly.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Mention {
    pub text: Option<String>,
    pub date: Option<String>,
    pub platform: Option<String>,
    pub source: Option<String>,
    #[serde(default)]
    pub sentiment_score: Option<Value>,
    #[serde(default)]
    pub sentiment: Option<Value>,
    #[serde(default)]
    pub score: Option<Value>,
    pub sentiment_label: Option<String>,
}

/// Three-way sentiment bucket derived from a label or a score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Polarity {
    Positive,
    Negative,
    Neutral,
}

/// Score cutoff used when no explicit label is present.
pub const POLARITY_THRESHOLD: f64 = 0.2;

impl Mention {
    pub fn new(text: impl Into<String>, sentiment: f64) -> Self {
        Self {
            text: Some(text.into()),
            sentiment_score: Value::from(sentiment).into(),
            ..Default::default()
        }
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.sentiment_label = Some(label.into());
        self
    }

    /// Non-empty text content, or `None` when the record carries no signal.
    pub fn content(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Resolves the sentiment score from the candidate fields in order:
    /// `sentiment_score`, `sentiment`, `score`. The first value that parses
    /// as a number wins; a record with no parsable candidate scores 0.0.
    pub fn resolved_sentiment(&self) -> f64 {
        [&self.sentiment_score, &self.sentiment, &self.score]
            .into_iter()
            .flatten()
            .find_map(parse_score)
            .unwrap_or(0.0)
    }

    /// Polarity bucket: explicit label wins over the numeric score.
    pub fn polarity(&self) -> Polarity {
        if let Some(label) = self.sentiment_label.as_deref() {
            match label.trim().to_lowercase().as_str() {
                "positive" => return Polarity::Positive,
                "negative" => return Polarity::Negative,
                "neutral" => return Polarity::Neutral,
                _ => {}
            }
        }
        Polarity::from_score(self.resolved_sentiment())
    }

    /// Calendar day for time bucketing. Accepts RFC 3339 timestamps,
    /// `YYYY-MM-DD HH:MM:SS`, and bare `YYYY-MM-DD` dates. Anything else
    /// excludes the record from time-based aggregations.
    pub fn day(&self) -> Option<NaiveDate> {
        let raw = self.date.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.date_naive());
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
            return Some(dt.date());
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
    }

    /// Raw platform label, preferring `platform` over `source`.
    pub fn raw_platform(&self) -> Option<&str> {
        self.platform
            .as_deref()
            .or(self.source.as_deref())
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

impl Polarity {
    pub fn from_score(score: f64) -> Self {
        if score > POLARITY_THRESHOLD {
            Polarity::Positive
        } else if score < -POLARITY_THRESHOLD {
            Polarity::Negative
        } else {
            Polarity::Neutral
        }
    }
}

fn parse_score(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn resolution_prefers_sentiment_score_field() {
        let mention: Mention = serde_json::from_str(
            r#"{"text": "x", "sentiment_score": 0.7, "sentiment": -0.3, "score": 0.1}"#,
        )
        .unwrap();
        assert_eq!(mention.resolved_sentiment(), 0.7);
    }

    #[test]
    fn resolution_falls_through_unparsable_candidates() {
        let mention: Mention = serde_json::from_str(
            r#"{"text": "x", "sentiment_score": "n/a", "sentiment": "-0.25"}"#,
        )
        .unwrap();
        assert_eq!(mention.resolved_sentiment(), -0.25);
    }

    #[test]
    fn missing_sentiment_defaults_to_zero() {
        let mention: Mention = serde_json::from_str(r#"{"text": "x"}"#).unwrap();
        assert_eq!(mention.resolved_sentiment(), 0.0);
    }

    #[test]
    fn label_wins_over_score_for_polarity() {
        let mention = Mention::new("great stuff", -0.9).with_label("Positive");
        assert_eq!(mention.polarity(), Polarity::Positive);
    }

    #[rstest]
    #[case(0.5, Polarity::Positive)]
    #[case(0.2, Polarity::Neutral)]
    #[case(-0.2, Polarity::Neutral)]
    #[case(-0.21, Polarity::Negative)]
    #[case(0.0, Polarity::Neutral)]
    fn polarity_thresholds(#[case] score: f64, #[case] expected: Polarity) {
        assert_eq!(Polarity::from_score(score), expected);
    }

    #[rstest]
    #[case("2024-03-05T14:30:00Z", Some((2024, 3, 5)))]
    #[case("2024-03-05T14:30:00+02:00", Some((2024, 3, 5)))]
    #[case("2024-03-05 14:30:00", Some((2024, 3, 5)))]
    #[case("2024-03-05", Some((2024, 3, 5)))]
    #[case("yesterday", None)]
    #[case("", None)]
    fn day_parsing(#[case] raw: &str, #[case] expected: Option<(i32, u32, u32)>) {
        let mention = Mention::new("x", 0.0).with_date(raw);
        let expected = expected.map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap());
        assert_eq!(mention.day(), expected);
    }

    #[test]
    fn content_rejects_blank_text() {
        assert_eq!(Mention::new("   ", 0.0).content(), None);
        assert_eq!(Mention::default().content(), None);
        assert_eq!(Mention::new("hello", 0.0).content(), Some("hello"));
    }

    #[test]
    fn platform_prefers_platform_over_source() {
        let mut mention = Mention::new("x", 0.0);
        mention.source = Some("reddit".to_string());
        assert_eq!(mention.raw_platform(), Some("reddit"));
        mention.platform = Some("twitter".to_string());
        assert_eq!(mention.raw_platform(), Some("twitter"));
    }
}
