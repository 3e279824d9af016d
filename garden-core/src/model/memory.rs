// Flat memory list used by the side panel and the filter index.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::wire::{error_message, json_kind, parse_timestamp};
use super::{Category, Sentiment};
use crate::error::{GardenError, Result};

/// One stored memory. `id` matches a fact node id in the graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryItem {
    pub id: String,
    pub content: String,
    pub category: Category,
    pub sentiment: Sentiment,
    pub timestamp: Option<DateTime<Utc>>,
    pub weight: f64,
}

impl MemoryItem {
    pub fn new(id: &str, content: &str, category: Category, sentiment: Sentiment) -> Self {
        Self {
            id: id.to_string(),
            content: content.to_string(),
            category,
            sentiment,
            timestamp: None,
            weight: 1.0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawMemory {
    id: String,
    #[serde(default)]
    content: String,
    category: Option<String>,
    sentiment: Option<String>,
    timestamp: Option<String>,
    weight: Option<f64>,
}

impl From<RawMemory> for MemoryItem {
    fn from(raw: RawMemory) -> Self {
        Self {
            id: raw.id,
            content: raw.content,
            category: Category::parse_lenient(raw.category.as_deref()),
            sentiment: Sentiment::parse_lenient(raw.sentiment.as_deref()),
            timestamp: parse_timestamp(raw.timestamp.as_deref()),
            weight: raw.weight.filter(|w| w.is_finite()).unwrap_or(1.0),
        }
    }
}

/// Decode the memory list endpoint's body (a JSON array).
pub fn parse_memories_body(body: &str) -> Result<Vec<MemoryItem>> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let items = match serde_json::from_str::<Value>(body)? {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items,
        Value::Object(obj) => {
            let msg = error_message(&obj).unwrap_or_else(|| "expected a memory list, got an object".to_string());
            return Err(GardenError::ErrorResponse(msg));
        }
        other => {
            return Err(GardenError::ErrorResponse(format!(
                "expected a memory list, got {}",
                json_kind(&other)
            )));
        }
    };

    let mut memories = Vec::with_capacity(items.len());
    for item in items {
        match serde_json::from_value::<RawMemory>(item) {
            Ok(raw) if !raw.id.is_empty() => memories.push(raw.into()),
            Ok(_) => log::warn!("skipping memory with empty id"),
            Err(e) => log::warn!("skipping malformed memory: {}", e),
        }
    }
    Ok(memories)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_memory_list() {
        let body = r#"[
            {"id": "m1", "session_id": "s", "content": "Coffee with Ana", "category": "person",
             "sentiment": "love", "timestamp": "2024-05-01T10:00:00+00:00", "weight": 1.5},
            {"id": "m2", "content": "Went hiking", "category": "place", "sentiment": "excitement"},
            {"content": "no id"}
        ]"#;
        let memories = parse_memories_body(body).unwrap();
        assert_eq!(memories.len(), 2);
        assert_eq!(memories[0].category, Category::Person);
        assert_eq!(memories[0].weight, 1.5);
        assert_eq!(memories[1].category, Category::Thought);
        assert_eq!(memories[1].sentiment, Sentiment::Neutral);
    }

    #[test]
    fn test_error_object_rejected() {
        let err = parse_memories_body(r#"{"error": "session not found"}"#).unwrap_err();
        assert!(matches!(err, GardenError::ErrorResponse(ref m) if m == "session not found"));
        assert!(parse_memories_body("null").unwrap().is_empty());
    }
}
