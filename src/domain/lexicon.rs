use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Lexicons are loaded once and treated as immutable configuration data.
/// Loading is the only fallible surface in the crate; the aggregations
/// themselves never error.
#[derive(Error, Debug)]
pub enum LexiconError {
    #[error("Malformed lexicon JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error("Duplicate category: {name}")]
    DuplicateCategory { name: String },

    #[error("Category '{name}' has no keywords")]
    EmptyCategory { name: String },

    #[error("Entity '{name}' duplicated in dictionary")]
    DuplicateEntity { name: String },

    #[error("Keyword pattern failed to compile: {0}")]
    Pattern(#[from] regex::Error),
}

/// One emotion category and the keywords that signal it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmotionCategory {
    pub name: String,
    pub keywords: Vec<String>,
}

/// Ordered emotion category table. Order is significant: it breaks ties
/// when picking a record's dominant emotion.
#[derive(Debug, Clone, PartialEq)]
pub struct EmotionLexicon {
    categories: Vec<EmotionCategory>,
}

impl Default for EmotionLexicon {
    fn default() -> Self {
        let table: [(&str, &[&str]); 8] = [
            (
                "joy",
                &[
                    "happy", "joy", "delighted", "excited", "thrilled", "love", "wonderful",
                    "fantastic", "amazing", "great", "awesome", "celebrate",
                ],
            ),
            (
                "trust",
                &[
                    "trust", "reliable", "dependable", "honest", "loyal", "confident", "secure",
                    "proven", "credible",
                ],
            ),
            (
                "fear",
                &[
                    "afraid", "scared", "terrified", "worried", "anxious", "fear", "panic",
                    "dread", "nervous", "alarming",
                ],
            ),
            (
                "surprise",
                &[
                    "surprised", "shocked", "astonished", "unexpected", "stunning", "incredible",
                    "unbelievable", "wow",
                ],
            ),
            (
                "sadness",
                &[
                    "sad", "disappointed", "unhappy", "miserable", "heartbroken", "depressing",
                    "tragic", "grief", "sorry",
                ],
            ),
            (
                "disgust",
                &[
                    "disgusting", "gross", "awful", "horrible", "repulsive", "nasty", "vile",
                    "terrible", "revolting",
                ],
            ),
            (
                "anger",
                &[
                    "angry", "furious", "outraged", "mad", "annoyed", "frustrated", "hate",
                    "infuriating", "ridiculous",
                ],
            ),
            (
                "anticipation",
                &[
                    "anticipate", "expect", "awaiting", "upcoming", "soon", "eager", "hope",
                    "looking forward", "countdown",
                ],
            ),
        ];
        let categories = table
            .into_iter()
            .map(|(name, keywords)| EmotionCategory {
                name: name.to_string(),
                keywords: keywords.iter().map(|k| k.to_string()).collect(),
            })
            .collect();
        Self { categories }
    }
}

impl EmotionLexicon {
    pub fn new(categories: Vec<EmotionCategory>) -> Result<Self, LexiconError> {
        let mut seen = HashSet::new();
        for category in &categories {
            if category.keywords.is_empty() {
                return Err(LexiconError::EmptyCategory {
                    name: category.name.clone(),
                });
            }
            if !seen.insert(category.name.to_lowercase()) {
                return Err(LexiconError::DuplicateCategory {
                    name: category.name.clone(),
                });
            }
        }
        Ok(Self { categories })
    }

    pub fn from_json_str(json: &str) -> Result<Self, LexiconError> {
        let categories: Vec<EmotionCategory> = serde_json::from_str(json)?;
        Self::new(categories)
    }

    pub fn categories(&self) -> &[EmotionCategory] {
        &self.categories
    }
}

/// Kind tag attached to each dictionary entity, carried through to graph
/// nodes so the rendering layer can color them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Person,
    Organization,
    Product,
    Place,
    Topic,
}

/// One named entity with its canonical name and surface aliases.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityEntry {
    pub name: String,
    pub entity_type: EntityType,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Entity dictionary used for co-occurrence graphs. Deployment-specific;
/// loaded from configuration rather than shipped with defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityLexicon {
    entries: Vec<EntityEntry>,
}

impl EntityLexicon {
    pub fn new(entries: Vec<EntityEntry>) -> Result<Self, LexiconError> {
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.name.to_lowercase()) {
                return Err(LexiconError::DuplicateEntity {
                    name: entry.name.clone(),
                });
            }
        }
        Ok(Self { entries })
    }

    pub fn from_json_str(json: &str) -> Result<Self, LexiconError> {
        let entries: Vec<EntityEntry> = serde_json::from_str(json)?;
        Self::new(entries)
    }

    pub fn entries(&self) -> &[EntityEntry] {
        &self.entries
    }
}

/// Stop words removed during theme tokenization.
#[derive(Debug, Clone, PartialEq)]
pub struct StopWords {
    words: HashSet<String>,
}

impl Default for StopWords {
    fn default() -> Self {
        const DEFAULTS: &[&str] = &[
            "the", "and", "for", "are", "but", "not", "you", "all", "can", "had", "her", "was",
            "one", "our", "out", "day", "get", "has", "him", "his", "how", "its", "new", "now",
            "old", "see", "two", "way", "who", "did", "that", "this", "with", "have", "from",
            "they", "will", "been", "were", "would", "there", "their", "what", "about", "which",
            "when", "your", "said", "them", "some", "into", "just", "than", "then", "more",
            "very", "also", "like", "only", "over", "such", "most", "other", "after", "because",
            "could", "should", "these", "those", "being",
        ];
        Self {
            words: DEFAULTS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl StopWords {
    pub fn new(words: impl IntoIterator<Item = String>) -> Self {
        Self {
            words: words.into_iter().map(|w| w.to_lowercase()).collect(),
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }
}

/// Platform label normalization rules: alias table plus exclusion list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlatformRules {
    pub aliases: HashMap<String, String>,
    pub excluded: HashSet<String>,
}

impl Default for PlatformRules {
    fn default() -> Self {
        let aliases = [
            ("x", "Twitter"),
            ("x (twitter)", "Twitter"),
            ("twitter.com", "Twitter"),
            ("twitter", "Twitter"),
            ("fb", "Facebook"),
            ("facebook.com", "Facebook"),
            ("facebook", "Facebook"),
            ("ig", "Instagram"),
            ("insta", "Instagram"),
            ("instagram", "Instagram"),
            ("reddit.com", "Reddit"),
            ("reddit", "Reddit"),
            ("yt", "YouTube"),
            ("youtube", "YouTube"),
            ("linkedin", "LinkedIn"),
            ("tiktok", "TikTok"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let excluded = ["unknown", "other", "n/a", "none"]
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        Self { aliases, excluded }
    }
}
