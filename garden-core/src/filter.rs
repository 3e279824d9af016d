//! Filtered view over the flat memory list.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{Category, MemoryItem, Sentiment};

/// Side-panel filter. `None` means "all".
///
/// On the wire the "all" value is the literal string `"all"`, matching the
/// filter pills; unknown values also read as "all".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterState {
    #[serde(with = "all_or")]
    pub category: Option<Category>,
    #[serde(with = "all_or")]
    pub sentiment: Option<Sentiment>,
    pub search_term: String,
}

impl FilterState {
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.sentiment.is_none() && self.search_term.is_empty()
    }
}

mod all_or {
    use std::fmt::Display;
    use std::str::FromStr;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<T: Display, S: Serializer>(value: &Option<T>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => s.collect_str(v),
            None => s.serialize_str("all"),
        }
    }

    pub fn deserialize<'de, T: FromStr, D: Deserializer<'de>>(d: D) -> Result<Option<T>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        Ok(raw.and_then(|s| s.parse().ok()))
    }
}

fn matches(memory: &MemoryItem, lowered: &str, filter: &FilterState, needle: &str) -> bool {
    filter.category.is_none_or(|c| c == memory.category)
        && filter.sentiment.is_none_or(|s| s == memory.sentiment)
        && (needle.is_empty() || lowered.contains(needle))
}

/// Order-preserving filter over a memory slice.
pub fn apply(memories: &[MemoryItem], filter: &FilterState) -> Vec<MemoryItem> {
    let needle = filter.search_term.to_lowercase();
    memories
        .iter()
        .filter(|m| matches(m, &m.content.to_lowercase(), filter, &needle))
        .cloned()
        .collect()
}

/// The memory list plus lowercased contents, rebuilt on each memory fetch.
#[derive(Debug, Clone, Default)]
pub struct FilterIndex {
    memories: Vec<MemoryItem>,
    lowered: Vec<String>,
}

impl FilterIndex {
    pub fn new(memories: Vec<MemoryItem>) -> Self {
        let lowered = memories.iter().map(|m| m.content.to_lowercase()).collect();
        Self { memories, lowered }
    }

    pub fn len(&self) -> usize {
        self.memories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memories.is_empty()
    }

    pub fn memories(&self) -> &[MemoryItem] {
        &self.memories
    }

    pub fn get(&self, id: &str) -> Option<&MemoryItem> {
        self.memories.iter().find(|m| m.id == id)
    }

    /// Same result as [`apply`] without re-lowercasing every memory.
    pub fn apply(&self, filter: &FilterState) -> Vec<&MemoryItem> {
        let needle = filter.search_term.to_lowercase();
        self.memories
            .iter()
            .zip(&self.lowered)
            .filter(|(m, lowered)| matches(m, lowered, filter, &needle))
            .map(|(m, _)| m)
            .collect()
    }

    /// Memories per category, every category present (zero if none).
    pub fn category_counts(&self) -> BTreeMap<Category, usize> {
        let mut counts: BTreeMap<Category, usize> = Category::ALL.into_iter().map(|c| (c, 0)).collect();
        for m in &self.memories {
            *counts.entry(m.category).or_default() += 1;
        }
        counts
    }
}
