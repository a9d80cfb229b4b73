use ordered_float::OrderedFloat;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::domain::bucket::{PairBucket, PairKey};
use crate::domain::lexicon::{EntityLexicon, EntityType, LexiconError};
use crate::domain::mention::Mention;

const SHIFT_LIMIT: usize = 5;

/// Thresholds and limits for graph construction.
#[derive(Debug, Clone, Copy)]
pub struct EntityGraphConfig {
    /// Maximum character distance between two matches for them to count as
    /// co-occurring.
    pub window_size: usize,
    pub min_entity_count: usize,
    pub min_pair_count: usize,
    /// When set, only the strongest pairs by raw co-occurrence count become
    /// edges.
    pub max_edges: Option<usize>,
}

impl Default for EntityGraphConfig {
    fn default() -> Self {
        Self {
            window_size: 100,
            min_entity_count: 2,
            min_pair_count: 1,
            max_edges: Some(50),
        }
    }
}

/// Builds a weighted, undirected entity co-occurrence graph from mention
/// text, plus ranked sentiment-shift lists for the insight panels.
#[derive(Debug)]
pub struct EntityGraphBuilder {
    entities: Vec<EntityInfo>,
    /// Keyword matchers ordered longest keyword first, so multi-word
    /// entities claim their span before any shorter entry can.
    matchers: Vec<KeywordMatcher>,
    config: EntityGraphConfig,
}

#[derive(Debug, Clone)]
struct EntityInfo {
    name: String,
    entity_type: EntityType,
}

#[derive(Debug)]
struct KeywordMatcher {
    entity: usize,
    pattern: Regex,
    keyword_len: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub val: usize,
    pub sentiment: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GraphLink {
    pub source: String,
    pub target: String,
    pub value: usize,
    pub sentiment: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EntityGraph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

/// A pair whose joint sentiment departs from its members' baselines.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PairShift {
    pub source: String,
    pub target: String,
    pub count: usize,
    pub pair_sentiment: f64,
    pub shift: f64,
    pub significance: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EntityInsights {
    pub graph: EntityGraph,
    pub positive_shifts: Vec<PairShift>,
    pub negative_shifts: Vec<PairShift>,
}

/// Per-entity aggregate while folding records.
#[derive(Debug, Clone, Default)]
struct EntityStats {
    count: usize,
    sentiment_sum: f64,
}

impl EntityStats {
    fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sentiment_sum / self.count as f64
        }
    }
}

impl EntityGraphBuilder {
    pub fn new(lexicon: EntityLexicon, config: EntityGraphConfig) -> Result<Self, LexiconError> {
        let entities: Vec<EntityInfo> = lexicon
            .entries()
            .iter()
            .map(|e| EntityInfo {
                name: e.name.clone(),
                entity_type: e.entity_type,
            })
            .collect();

        let mut matchers = Vec::new();
        for (idx, entry) in lexicon.entries().iter().enumerate() {
            for keyword in std::iter::once(&entry.name).chain(entry.aliases.iter()) {
                let keyword = keyword.to_lowercase();
                let pattern = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(&keyword)))?;
                matchers.push(KeywordMatcher {
                    entity: idx,
                    pattern,
                    keyword_len: keyword.len(),
                });
            }
        }
        matchers.sort_by(|a, b| b.keyword_len.cmp(&a.keyword_len));

        Ok(Self {
            entities,
            matchers,
            config,
        })
    }

    pub fn build(&self, records: &[Mention]) -> EntityInsights {
        // Scanning dominates on large inputs; the fold stays sequential so
        // the output ordering is deterministic.
        let scanned: Vec<(Vec<EntityMatch>, f64)> = records
            .par_iter()
            .filter_map(|record| {
                let text = record.content()?;
                let matches = self.scan(text);
                if matches.is_empty() {
                    None
                } else {
                    Some((matches, record.resolved_sentiment()))
                }
            })
            .collect();

        let mut stats: Vec<EntityStats> = vec![EntityStats::default(); self.entities.len()];
        let mut pairs: HashMap<PairKey, PairBucket> = HashMap::new();

        for (matches, sentiment) in &scanned {
            // Presence counts once per record per entity.
            let present: HashSet<usize> = matches.iter().map(|m| m.entity).collect();
            for &entity in &present {
                stats[entity].count += 1;
                stats[entity].sentiment_sum += *sentiment;
            }

            // Co-occurrence counts once per record per pair.
            let mut seen: HashSet<PairKey> = HashSet::new();
            for (i, a) in matches.iter().enumerate() {
                for b in &matches[i + 1..] {
                    if a.entity == b.entity {
                        continue;
                    }
                    if a.offset.abs_diff(b.offset) > self.config.window_size {
                        continue;
                    }
                    let key = PairKey::new(
                        self.entities[a.entity].name.clone(),
                        self.entities[b.entity].name.clone(),
                    );
                    if seen.insert(key.clone()) {
                        pairs
                            .entry(key.clone())
                            .or_insert_with(|| PairBucket::new(key))
                            .record(*sentiment);
                    }
                }
            }
        }

        self.assemble(stats, pairs)
    }

    /// All dictionary matches with character offsets. Longer keywords run
    /// first and claim their span; overlapping shorter matches are dropped.
    fn scan(&self, text: &str) -> Vec<EntityMatch> {
        let mut claimed: Vec<(usize, usize)> = Vec::new();
        let mut matches = Vec::new();
        for matcher in &self.matchers {
            for found in matcher.pattern.find_iter(text) {
                let span = (found.start(), found.end());
                if claimed.iter().any(|c| span.0 < c.1 && c.0 < span.1) {
                    continue;
                }
                claimed.push(span);
                matches.push(EntityMatch {
                    entity: matcher.entity,
                    offset: found.start(),
                });
            }
        }
        matches.sort_by_key(|m| m.offset);

        // The window is measured in characters, but the regex reports byte
        // offsets; remap in one pass over the text.
        let mut remaining = matches.iter_mut().peekable();
        for (char_idx, (byte_idx, _)) in text.char_indices().enumerate() {
            while let Some(m) = remaining.peek_mut() {
                if m.offset == byte_idx {
                    m.offset = char_idx;
                    remaining.next();
                } else {
                    break;
                }
            }
        }
        matches
    }

    fn assemble(
        &self,
        stats: Vec<EntityStats>,
        pairs: HashMap<PairKey, PairBucket>,
    ) -> EntityInsights {
        let surviving: HashMap<&str, usize> = self
            .entities
            .iter()
            .enumerate()
            .filter(|(idx, _)| stats[*idx].count >= self.config.min_entity_count)
            .map(|(idx, info)| (info.name.as_str(), idx))
            .collect();

        // HashMap order is not deterministic; sort by key before ranking.
        let mut retained: Vec<PairBucket> = pairs
            .into_values()
            .filter(|p| {
                p.count >= self.config.min_pair_count
                    && surviving.contains_key(p.key.first())
                    && surviving.contains_key(p.key.second())
            })
            .collect();
        retained.sort_by(|a, b| a.key.cmp(&b.key));

        let shifts: Vec<PairShift> = retained
            .iter()
            .map(|pair| {
                let a = surviving[pair.key.first()];
                let b = surviving[pair.key.second()];
                let baseline = (stats[a].average() + stats[b].average()) / 2.0;
                let shift = pair.average_sentiment() - baseline;
                let smaller = stats[a].count.min(stats[b].count);
                PairShift {
                    source: pair.key.first().to_string(),
                    target: pair.key.second().to_string(),
                    count: pair.count,
                    pair_sentiment: pair.average_sentiment(),
                    shift,
                    significance: pair.count as f64
                        * shift.abs()
                        * (1.0 + smaller as f64 / 10.0),
                }
            })
            .collect();

        let mut positive_shifts: Vec<PairShift> =
            shifts.iter().filter(|s| s.shift > 0.0).cloned().collect();
        positive_shifts.sort_by_key(|s| -OrderedFloat(s.significance));
        positive_shifts.truncate(SHIFT_LIMIT);

        let mut negative_shifts: Vec<PairShift> =
            shifts.iter().filter(|s| s.shift < 0.0).cloned().collect();
        negative_shifts.sort_by_key(|s| -OrderedFloat(s.significance));
        negative_shifts.truncate(SHIFT_LIMIT);

        retained.sort_by(|a, b| b.count.cmp(&a.count));
        if let Some(max_edges) = self.config.max_edges {
            retained.truncate(max_edges);
        }

        // Insert nodes in dictionary order so output is stable.
        let mut survivors: Vec<usize> = surviving.values().copied().collect();
        survivors.sort_unstable();
        let mut graph: UnGraph<usize, (usize, f64)> = UnGraph::new_undirected();
        let mut node_map: HashMap<usize, NodeIndex> = HashMap::new();
        for idx in survivors {
            node_map.insert(idx, graph.add_node(idx));
        }
        for pair in &retained {
            let a = node_map[&surviving[pair.key.first()]];
            let b = node_map[&surviving[pair.key.second()]];
            graph.add_edge(a, b, (pair.count, pair.average_sentiment()));
        }

        let nodes: Vec<GraphNode> = graph
            .node_indices()
            .map(|node| {
                let idx = graph[node];
                GraphNode {
                    id: self.entities[idx].name.clone(),
                    name: self.entities[idx].name.clone(),
                    entity_type: self.entities[idx].entity_type,
                    val: stats[idx].count,
                    sentiment: stats[idx].average(),
                }
            })
            .collect();
        let links: Vec<GraphLink> = graph
            .edge_references()
            .map(|edge| {
                let (count, sentiment) = *edge.weight();
                GraphLink {
                    source: self.entities[graph[edge.source()]].name.clone(),
                    target: self.entities[graph[edge.target()]].name.clone(),
                    value: count,
                    sentiment,
                }
            })
            .collect();

        debug!(
            nodes = nodes.len(),
            links = links.len(),
            "entity graph assembled"
        );

        EntityInsights {
            graph: EntityGraph { nodes, links },
            positive_shifts,
            negative_shifts,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct EntityMatch {
    entity: usize,
    offset: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::lexicon::EntityEntry;

    fn entity(name: &str, entity_type: EntityType, aliases: &[&str]) -> EntityEntry {
        EntityEntry {
            name: name.to_string(),
            entity_type,
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn builder(entries: Vec<EntityEntry>, config: EntityGraphConfig) -> EntityGraphBuilder {
        EntityGraphBuilder::new(EntityLexicon::new(entries).unwrap(), config).unwrap()
    }

    fn acme_widget() -> Vec<EntityEntry> {
        vec![
            entity("Acme", EntityType::Organization, &["acme corp"]),
            entity("Widget", EntityType::Product, &[]),
        ]
    }

    fn permissive() -> EntityGraphConfig {
        EntityGraphConfig {
            min_entity_count: 1,
            ..Default::default()
        }
    }

    #[test]
    fn pair_is_order_independent() {
        let builder = builder(acme_widget(), permissive());
        let records = vec![
            Mention::new("Acme shipped the Widget", 0.5),
            Mention::new("the Widget from Acme", 0.3),
        ];
        let insights = builder.build(&records);
        assert_eq!(insights.graph.links.len(), 1);
        let link = &insights.graph.links[0];
        assert_eq!((link.source.as_str(), link.target.as_str()), ("Acme", "Widget"));
        assert_eq!(link.value, 2);
        assert!((link.sentiment - 0.4).abs() < 1e-9);
    }

    #[test]
    fn filtered_entity_removes_its_pairs() {
        // Widget appears once: below min_entity_count=2, so the Acme-Widget
        // pair must vanish even though the co-occurrence was recorded.
        let builder = builder(acme_widget(), EntityGraphConfig::default());
        let records = vec![
            Mention::new("Acme shipped the Widget", 0.5),
            Mention::new("Acme earnings call", 0.1),
            Mention::new("Acme hiring spree", 0.2),
        ];
        let insights = builder.build(&records);
        assert!(insights.graph.links.is_empty());
        assert_eq!(insights.graph.nodes.len(), 1);
        assert_eq!(insights.graph.nodes[0].name, "Acme");
        assert_eq!(insights.graph.nodes[0].val, 3);
    }

    #[test]
    fn matches_outside_window_do_not_pair() {
        let config = EntityGraphConfig {
            window_size: 20,
            min_entity_count: 1,
            ..Default::default()
        };
        let builder = builder(acme_widget(), config);
        let filler = "x".repeat(60);
        let records = vec![Mention::new(format!("Acme {filler} Widget"), 0.0)];
        let insights = builder.build(&records);
        assert!(insights.graph.links.is_empty());
        assert_eq!(insights.graph.nodes.len(), 2);
    }

    #[test]
    fn window_is_measured_in_characters_not_bytes() {
        // Thirty "é" fillers put Widget 36 characters after Acme but 66
        // bytes after it; a 40-character window must still pair them.
        let config = EntityGraphConfig {
            window_size: 40,
            min_entity_count: 1,
            ..Default::default()
        };
        let builder = builder(acme_widget(), config);
        let filler = "é".repeat(30);
        let records = vec![Mention::new(format!("Acme {filler} Widget"), 0.3)];
        let insights = builder.build(&records);
        assert_eq!(insights.graph.links.len(), 1);
    }

    #[test]
    fn multi_word_alias_claims_span_before_shorter_name() {
        let entries = vec![
            entity("Acme Cloud", EntityType::Product, &[]),
            entity("Acme", EntityType::Organization, &[]),
        ];
        let builder = builder(entries, permissive());
        let insights = builder.build(&[Mention::new("acme cloud went down", -0.6)]);
        assert_eq!(insights.graph.nodes.len(), 1);
        assert_eq!(insights.graph.nodes[0].name, "Acme Cloud");
    }

    #[test]
    fn keyword_inside_longer_word_does_not_match() {
        let entries = vec![entity("Cat", EntityType::Topic, &[])];
        let builder = builder(entries, permissive());
        let insights = builder.build(&[Mention::new("a catastrophe unfolded", -0.9)]);
        assert!(insights.graph.nodes.is_empty());
    }

    #[test]
    fn pair_counts_once_per_record() {
        let builder = builder(acme_widget(), permissive());
        let records = vec![Mention::new("Acme Widget and again Acme Widget", 0.2)];
        let insights = builder.build(&records);
        assert_eq!(insights.graph.links.len(), 1);
        assert_eq!(insights.graph.links[0].value, 1);
    }

    #[test]
    fn max_edges_keeps_strongest_pairs() {
        let entries = vec![
            entity("Alpha", EntityType::Topic, &[]),
            entity("Beta", EntityType::Topic, &[]),
            entity("Gamma", EntityType::Topic, &[]),
        ];
        let config = EntityGraphConfig {
            min_entity_count: 1,
            max_edges: Some(1),
            ..Default::default()
        };
        let builder = builder(entries, config);
        let records = vec![
            Mention::new("Alpha and Beta", 0.1),
            Mention::new("Alpha with Beta again", 0.2),
            Mention::new("Beta meets Gamma", 0.3),
        ];
        let insights = builder.build(&records);
        assert_eq!(insights.graph.links.len(), 1);
        let link = &insights.graph.links[0];
        assert_eq!((link.source.as_str(), link.target.as_str()), ("Alpha", "Beta"));
    }

    #[test]
    fn shifts_split_by_sign_and_rank_by_significance() {
        let entries = vec![
            entity("Alpha", EntityType::Topic, &[]),
            entity("Beta", EntityType::Topic, &[]),
            entity("Gamma", EntityType::Topic, &[]),
        ];
        let builder = builder(entries, permissive());
        let records = vec![
            // Baselines: Alpha mixed, Beta positive, Gamma negative.
            Mention::new("Alpha alone", 0.0),
            Mention::new("Beta alone", 0.6),
            Mention::new("Gamma alone", -0.6),
            // Pair sentiment above the Alpha/Beta baseline.
            Mention::new("Alpha and Beta", 0.9),
            // Pair sentiment below the Alpha/Gamma baseline.
            Mention::new("Alpha and Gamma", -0.9),
        ];
        let insights = builder.build(&records);
        assert_eq!(insights.positive_shifts.len(), 1);
        let up = &insights.positive_shifts[0];
        assert_eq!((up.source.as_str(), up.target.as_str()), ("Alpha", "Beta"));
        assert!(up.shift > 0.0);
        assert!(up.significance > 0.0);
        assert_eq!(insights.negative_shifts.len(), 1);
        assert!(insights.negative_shifts[0].shift < 0.0);
    }

    #[test]
    fn records_without_text_are_ignored() {
        let builder = builder(acme_widget(), permissive());
        let insights = builder.build(&[Mention::default()]);
        assert!(insights.graph.nodes.is_empty());
        assert!(insights.graph.links.is_empty());
    }
}
