use crate::domain::lexicon::PlatformRules;

/// Normalizes free-form platform/source labels before grouping: case
/// folding, alias resolution, exclusion list. Shared by the aggregation
/// services so every breakdown groups on the same names.
#[derive(Debug, Clone, Default)]
pub struct PlatformNormalizer {
    rules: PlatformRules,
}

impl PlatformNormalizer {
    pub fn new(rules: PlatformRules) -> Self {
        Self { rules }
    }

    /// Canonical platform name, or `None` when the label is excluded from
    /// platform groupings.
    pub fn normalize(&self, raw: &str) -> Option<String> {
        let folded = raw.trim().to_lowercase();
        if folded.is_empty() || self.rules.excluded.contains(&folded) {
            return None;
        }
        if let Some(canonical) = self.rules.aliases.get(&folded) {
            return Some(canonical.clone());
        }
        Some(title_case(&folded))
    }
}

fn title_case(label: &str) -> String {
    label
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
