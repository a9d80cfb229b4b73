use chrono::NaiveDate;
use ordered_float::OrderedFloat;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::domain::lexicon::{EmotionLexicon, LexiconError, PlatformRules};
use crate::domain::mention::Mention;
use crate::services::platform::PlatformNormalizer;

/// A record must score above this across all categories to qualify as
/// "top emotional content".
const TOP_CONTENT_THRESHOLD: f64 = 3.0;
const TOP_CONTENT_LIMIT: usize = 10;

/// Scores mention text against the emotion category table and rolls the
/// results up three ways: overall spectrum, per-day timeline, per-platform
/// breakdown.
#[derive(Debug, Clone)]
pub struct EmotionSpectrum {
    matchers: Vec<CategoryMatcher>,
    normalizer: PlatformNormalizer,
}

#[derive(Debug, Clone)]
struct CategoryMatcher {
    name: String,
    pattern: Regex,
}

/// Spectrum entry for one category. Zero-count categories are still listed
/// so the radar chart keeps all of its axes.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmotionFrequency {
    pub name: String,
    pub value: usize,
    pub intensity: f64,
}

/// One calendar day with each category's summed score.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmotionTimelinePoint {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub scores: BTreeMap<String, f64>,
}

/// One platform with each category's summed score.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmotionalPlatform {
    pub platform: String,
    #[serde(flatten)]
    pub scores: BTreeMap<String, f64>,
    pub total: f64,
}

/// A single high-scoring record with its dominant category.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmotionalContent {
    pub text: String,
    pub dominant_emotion: String,
    pub total_score: f64,
    pub sentiment: f64,
    pub platform: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmotionReport {
    pub emotion_frequency: Vec<EmotionFrequency>,
    pub emotion_timeline: Vec<EmotionTimelinePoint>,
    pub emotional_platforms: Vec<EmotionalPlatform>,
    pub top_emotional_content: Vec<EmotionalContent>,
}

impl Default for EmotionSpectrum {
    fn default() -> Self {
        // The built-in lexicon only contains literal keywords, so the
        // patterns always compile.
        Self::new(EmotionLexicon::default(), PlatformRules::default())
            .unwrap_or_else(|_| unreachable!("default lexicon compiles"))
    }
}

impl EmotionSpectrum {
    pub fn new(lexicon: EmotionLexicon, rules: PlatformRules) -> Result<Self, LexiconError> {
        let matchers = lexicon
            .categories()
            .iter()
            .map(|category| {
                let alternation = category
                    .keywords
                    .iter()
                    .map(|k| regex::escape(&k.to_lowercase()))
                    .collect::<Vec<_>>()
                    .join("|");
                let pattern = Regex::new(&format!(r"(?i)\b(?:{alternation})\b"))?;
                Ok(CategoryMatcher {
                    name: category.name.clone(),
                    pattern,
                })
            })
            .collect::<Result<Vec<_>, LexiconError>>()?;
        Ok(Self {
            matchers,
            normalizer: PlatformNormalizer::new(rules),
        })
    }

    pub fn analyze(&self, records: &[Mention]) -> EmotionReport {
        let mut counts = vec![0usize; self.matchers.len()];
        let mut intensity = vec![0.0f64; self.matchers.len()];
        let mut timeline: BTreeMap<NaiveDate, BTreeMap<String, f64>> = BTreeMap::new();
        let mut platforms: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
        let mut top_content: Vec<EmotionalContent> = Vec::new();

        for record in records {
            let Some(text) = record.content() else {
                continue;
            };
            let scores = self.score(text);
            let total: f64 = scores.iter().sum();
            if total == 0.0 {
                continue;
            }

            for (i, &score) in scores.iter().enumerate() {
                if score > 0.0 {
                    counts[i] += 1;
                    intensity[i] += score;
                }
            }

            if let Some(day) = record.day() {
                let row = timeline.entry(day).or_insert_with(|| self.zero_row());
                self.add_scores(row, &scores);
            }

            if let Some(platform) = record.raw_platform().and_then(|p| self.normalizer.normalize(p))
            {
                let row = platforms.entry(platform).or_insert_with(|| self.zero_row());
                self.add_scores(row, &scores);
            }

            if total > TOP_CONTENT_THRESHOLD {
                top_content.push(EmotionalContent {
                    text: text.to_string(),
                    dominant_emotion: self.dominant(&scores),
                    total_score: total,
                    sentiment: record.resolved_sentiment(),
                    platform: record
                        .raw_platform()
                        .and_then(|p| self.normalizer.normalize(p)),
                });
            }
        }

        let emotion_frequency = self
            .matchers
            .iter()
            .enumerate()
            .map(|(i, m)| EmotionFrequency {
                name: m.name.clone(),
                value: counts[i],
                intensity: if counts[i] == 0 {
                    0.0
                } else {
                    round2(intensity[i] / counts[i] as f64)
                },
            })
            .collect();

        let emotion_timeline: Vec<EmotionTimelinePoint> = timeline
            .into_iter()
            .map(|(date, scores)| EmotionTimelinePoint { date, scores })
            .collect();

        let mut emotional_platforms: Vec<EmotionalPlatform> = platforms
            .into_iter()
            .map(|(platform, scores)| {
                let total = scores.values().sum();
                EmotionalPlatform {
                    platform,
                    scores,
                    total,
                }
            })
            .collect();
        emotional_platforms.sort_by_key(|p| -OrderedFloat(p.total));

        top_content.sort_by_key(|c| -OrderedFloat(c.total_score));
        top_content.truncate(TOP_CONTENT_LIMIT);

        debug!(
            categories = self.matchers.len(),
            days = emotion_timeline.len(),
            platforms = emotional_platforms.len(),
            "emotion spectrum pass complete"
        );

        EmotionReport {
            emotion_frequency,
            emotion_timeline,
            emotional_platforms,
            top_emotional_content: top_content,
        }
    }

    /// Per-category keyword occurrence counts for one record's text.
    fn score(&self, text: &str) -> Vec<f64> {
        self.matchers
            .iter()
            .map(|m| m.pattern.find_iter(text).count() as f64)
            .collect()
    }

    /// Highest-scoring category; ties go to the earlier category in the
    /// lexicon's declared order.
    fn dominant(&self, scores: &[f64]) -> String {
        let mut best = 0;
        for (i, &score) in scores.iter().enumerate() {
            if score > scores[best] {
                best = i;
            }
        }
        self.matchers[best].name.clone()
    }

    fn zero_row(&self) -> BTreeMap<String, f64> {
        self.matchers
            .iter()
            .map(|m| (m.name.clone(), 0.0))
            .collect()
    }

    fn add_scores(&self, row: &mut BTreeMap<String, f64>, scores: &[f64]) {
        for (matcher, &score) in self.matchers.iter().zip(scores) {
            if score > 0.0 {
                *row.get_mut(&matcher.name).expect("row has all categories") += score;
            }
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
