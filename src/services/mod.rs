mod emotion_spectrum;
mod entity_graph;
mod platform;
mod theme_extractor;

pub use emotion_spectrum::{
    EmotionFrequency, EmotionReport, EmotionSpectrum, EmotionTimelinePoint, EmotionalContent,
    EmotionalPlatform,
};
pub use entity_graph::{
    EntityGraph, EntityGraphBuilder, EntityGraphConfig, EntityInsights, GraphLink, GraphNode,
    PairShift,
};
pub use platform::PlatformNormalizer;
pub use theme_extractor::{ThemeExtractor, TrendRow};
