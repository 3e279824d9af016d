//! Typed graph data for the garden.
//!
//! The backend speaks loosely-typed JSON (see `wire`). Everything past this
//! module works on validated `GraphData`: unique non-empty ids, known node
//! kinds, parsed enums and sane sizes.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod memory;
mod wire;

pub use memory::{MemoryItem, parse_memories_body};
pub use wire::{GraphPayload, RawLink, RawNode, parse_graph_body, parse_timestamp};

/// Default base radius for hubs when the payload omits one.
pub const DEFAULT_HUB_SIZE: f64 = 20.0;
/// Default base radius for facts when the payload omits one.
pub const DEFAULT_FACT_SIZE: f64 = 10.0;
/// Hubs are drawn larger than their base size.
pub const HUB_SCALE: f64 = 1.4;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Person,
    Event,
    Feeling,
    Preference,
    Thought,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Person,
        Category::Event,
        Category::Feeling,
        Category::Preference,
        Category::Thought,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Category::Person => "person",
            Category::Event => "event",
            Category::Feeling => "feeling",
            Category::Preference => "preference",
            Category::Thought => "thought",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Category::Person => "Person",
            Category::Event => "Event",
            Category::Feeling => "Feeling",
            Category::Preference => "Preference",
            Category::Thought => "Thought",
        }
    }

    /// Glyph shown in callouts and list rows.
    pub fn glyph(self) -> &'static str {
        match self {
            Category::Person => "●",
            Category::Event => "◆",
            Category::Feeling => "♡",
            Category::Preference => "★",
            Category::Thought => "◎",
        }
    }

    /// Unknown or missing categories fall back to `Thought`, the backend default.
    pub fn parse_lenient(raw: Option<&str>) -> Category {
        raw.and_then(|s| s.parse().ok()).unwrap_or(Category::Thought)
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.key() == lower)
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Love,
    Joy,
    Sadness,
    Curiosity,
    #[default]
    Neutral,
}

impl Sentiment {
    pub const ALL: [Sentiment; 5] = [
        Sentiment::Love,
        Sentiment::Joy,
        Sentiment::Sadness,
        Sentiment::Curiosity,
        Sentiment::Neutral,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Sentiment::Love => "love",
            Sentiment::Joy => "joy",
            Sentiment::Sadness => "sadness",
            Sentiment::Curiosity => "curiosity",
            Sentiment::Neutral => "neutral",
        }
    }

    pub fn parse_lenient(raw: Option<&str>) -> Sentiment {
        raw.and_then(|s| s.parse().ok()).unwrap_or_default()
    }
}

impl FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Sentiment::ALL
            .into_iter()
            .find(|c| c.key() == lower)
            .ok_or_else(|| format!("unknown sentiment '{}'", s))
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// One stored memory.
    Fact,
    /// A category hub that fact nodes hang off.
    Category,
}

impl NodeKind {
    /// `"memory"` is what the backend emits for facts.
    pub fn parse(raw: &str) -> Option<NodeKind> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "fact" | "memory" => Some(NodeKind::Fact),
            "category" => Some(NodeKind::Category),
            _ => None,
        }
    }
}

/// A validated node: either a fact or a category hub.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    /// Always set for facts. For hubs, the category the hub stands for when known.
    pub category: Option<Category>,
    pub sentiment: Sentiment,
    /// Base radius (semantic weight).
    pub size: f64,
    pub timestamp: Option<DateTime<Utc>>,
    pub full_content: String,
}

impl GraphNode {
    pub fn fact(id: &str, label: &str, category: Category, sentiment: Sentiment) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            kind: NodeKind::Fact,
            category: Some(category),
            sentiment,
            size: DEFAULT_FACT_SIZE,
            timestamp: None,
            full_content: label.to_string(),
        }
    }

    pub fn hub(category: Category) -> Self {
        Self {
            id: format!("cat-{}", category.key()),
            label: category.title().to_string(),
            kind: NodeKind::Category,
            category: Some(category),
            sentiment: Sentiment::Neutral,
            size: DEFAULT_HUB_SIZE,
            timestamp: None,
            full_content: String::new(),
        }
    }

    pub fn is_hub(&self) -> bool {
        self.kind == NodeKind::Category
    }

    /// Radius the node is drawn (and hit-tested) at, before pulsing.
    pub fn radius(&self) -> f64 {
        if self.is_hub() { self.size * HUB_SCALE } else { self.size }
    }
}

/// A membership edge. Endpoints are not guaranteed to resolve.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub source: String,
    pub target: String,
}

impl Link {
    pub fn new(source: &str, target: &str) -> Self {
        Self { source: source.to_string(), target: target.to_string() }
    }
}

/// The graph the controller currently displays.
#[derive(Debug, Clone, Default)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<Link>,
    index: HashMap<String, usize>,
}

impl GraphData {
    /// Build from already-typed nodes. Empty and duplicate ids are dropped,
    /// first occurrence wins.
    pub fn new(nodes: Vec<GraphNode>, links: Vec<Link>) -> Self {
        let mut kept: Vec<GraphNode> = Vec::with_capacity(nodes.len());
        let mut index: HashMap<String, usize> = HashMap::with_capacity(nodes.len());

        for node in nodes {
            if node.id.is_empty() {
                log::warn!("dropping node with empty id (label {:?})", node.label);
                continue;
            }
            if index.contains_key(&node.id) {
                log::warn!("dropping duplicate node id '{}'", node.id);
                continue;
            }
            index.insert(node.id.clone(), kept.len());
            kept.push(node);
        }

        let dangling = links
            .iter()
            .filter(|l| !index.contains_key(&l.source) || !index.contains_key(&l.target))
            .count();
        if dangling > 0 {
            log::debug!("{} link(s) reference unknown nodes and will be skipped", dangling);
        }

        Self { nodes: kept, links, index }
    }

    /// Validate a wire payload.
    pub fn from_payload(payload: GraphPayload) -> Self {
        let nodes = payload.nodes.into_iter().filter_map(RawNode::validate).collect();
        let links = payload
            .links
            .into_iter()
            .map(|l| Link { source: l.source, target: l.target })
            .collect();
        Self::new(nodes, links)
    }

    pub fn get(&self, id: &str) -> Option<&GraphNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn fact_count(&self) -> usize {
        self.nodes.iter().filter(|n| !n.is_hub()).count()
    }

    /// Links whose endpoints both resolve, as (source, target) node pairs.
    pub fn resolved_links(&self) -> impl Iterator<Item = (&GraphNode, &GraphNode)> + '_ {
        self.links.iter().filter_map(|l| Some((self.get(&l.source)?, self.get(&l.target)?)))
    }
}

/// Title-case a category key for a hub label ("feeling" -> "Feeling").
pub fn title_case(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}
