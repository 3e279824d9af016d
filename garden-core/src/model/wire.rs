// Wire format of the graph endpoint.
//
// Bodies are decoded node by node so one malformed entry costs that entry,
// not the whole refresh.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::{
    Category, DEFAULT_FACT_SIZE, DEFAULT_HUB_SIZE, GraphNode, NodeKind, Sentiment, title_case,
};
use crate::error::{GardenError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawNode {
    #[serde(default)]
    pub id: String,
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub category: Option<String>,
    pub sentiment: Option<String>,
    pub size: Option<f64>,
    pub timestamp: Option<String>,
    #[serde(alias = "fullContent", alias = "content")]
    pub full_content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLink {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub target: String,
}

/// Decoded graph body, before validation.
#[derive(Debug, Clone, Default)]
pub struct GraphPayload {
    pub nodes: Vec<RawNode>,
    pub links: Vec<RawLink>,
}

impl RawNode {
    /// Turn a wire node into a typed one. Returns `None` for unknown node types.
    pub fn validate(self) -> Option<GraphNode> {
        let kind = match self.kind.as_deref().and_then(NodeKind::parse) {
            Some(kind) => kind,
            None => {
                log::warn!("dropping node '{}' with unknown type {:?}", self.id, self.kind);
                return None;
            }
        };

        let default_size = match kind {
            NodeKind::Category => DEFAULT_HUB_SIZE,
            NodeKind::Fact => DEFAULT_FACT_SIZE,
        };
        let size = self.size.filter(|s| s.is_finite() && *s > 0.0).unwrap_or(default_size);

        let category = match kind {
            NodeKind::Fact => Some(Category::parse_lenient(self.category.as_deref())),
            NodeKind::Category => self
                .category
                .as_deref()
                .and_then(|c| c.parse().ok())
                .or_else(|| self.id.strip_prefix("cat-").and_then(|c| c.parse().ok()))
                .or_else(|| self.id.parse().ok()),
        };

        let label = match (self.label, kind) {
            (Some(label), _) if !label.is_empty() => label,
            (_, NodeKind::Category) => title_case(self.id.strip_prefix("cat-").unwrap_or(&self.id)),
            (_, NodeKind::Fact) => self.full_content.clone().unwrap_or_default(),
        };
        let full_content = self.full_content.unwrap_or_else(|| label.clone());

        Some(GraphNode {
            id: self.id,
            label,
            kind,
            category,
            sentiment: Sentiment::parse_lenient(self.sentiment.as_deref()),
            size,
            timestamp: parse_timestamp(self.timestamp.as_deref()),
            full_content,
        })
    }
}

/// RFC 3339, or a naive ISO timestamp taken as UTC. Empty or garbage is `None`.
pub fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Pull a message out of an error-shaped body like `{"detail": "..."}`.
pub(crate) fn error_message(obj: &serde_json::Map<String, Value>) -> Option<String> {
    ["error", "detail", "message"].iter().find_map(|key| {
        obj.get(*key).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    })
}

fn decode_items<T: for<'de> Deserialize<'de>>(items: Vec<Value>, what: &str) -> Vec<T> {
    let total = items.len();
    let decoded: Vec<T> = items
        .into_iter()
        .filter_map(|v| match serde_json::from_value(v) {
            Ok(item) => Some(item),
            Err(e) => {
                log::warn!("skipping malformed {}: {}", what, e);
                None
            }
        })
        .collect();
    if decoded.len() < total {
        log::warn!("decoded {}/{} {}s", decoded.len(), total, what);
    }
    decoded
}

/// Decode the graph endpoint's body.
///
/// `null`, `{}` and an empty string decode to an empty payload. An object that
/// carries `error`/`detail`/`message` and no `nodes` is reported as
/// `GardenError::ErrorResponse`.
pub fn parse_graph_body(body: &str) -> Result<GraphPayload> {
    if body.trim().is_empty() {
        return Ok(GraphPayload::default());
    }
    let value: Value = serde_json::from_str(body)?;
    let mut obj = match value {
        Value::Null => return Ok(GraphPayload::default()),
        Value::Object(obj) => obj,
        other => {
            return Err(GardenError::ErrorResponse(format!(
                "expected a graph object, got {}",
                json_kind(&other)
            )));
        }
    };

    if !obj.contains_key("nodes") {
        if let Some(msg) = error_message(&obj) {
            return Err(GardenError::ErrorResponse(msg));
        }
    }

    let nodes = match obj.remove("nodes") {
        Some(Value::Array(items)) => decode_items(items, "node"),
        _ => Vec::new(),
    };
    let links = match obj.remove("links") {
        Some(Value::Array(items)) => decode_items(items, "link"),
        _ => Vec::new(),
    };

    Ok(GraphPayload { nodes, links })
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GraphData;

    const BACKEND_BODY: &str = r#"{
        "nodes": [
            {"id": "cat-feeling", "label": "Feeling", "type": "category", "sentiment": "neutral", "size": 20},
            {"id": "m1", "label": "I felt calm by the sea", "type": "memory", "sentiment": "joy",
             "category": "feeling", "size": 12.0, "timestamp": "2024-05-01T10:00:00.123456+00:00"},
            {"id": "m2", "label": "Mystery", "type": "memory", "timestamp": ""}
        ],
        "links": [{"source": "cat-feeling", "target": "m1"}]
    }"#;

    #[test]
    fn test_parse_backend_body() {
        let payload = parse_graph_body(BACKEND_BODY).unwrap();
        let data = GraphData::from_payload(payload);

        assert_eq!(data.nodes.len(), 3);
        let hub = data.get("cat-feeling").unwrap();
        assert!(hub.is_hub());
        assert_eq!(hub.category, Some(Category::Feeling));

        let m1 = data.get("m1").unwrap();
        assert_eq!(m1.kind, NodeKind::Fact);
        assert_eq!(m1.sentiment, Sentiment::Joy);
        assert_eq!(m1.size, 12.0);
        assert!(m1.timestamp.is_some());

        let m2 = data.get("m2").unwrap();
        assert_eq!(m2.category, Some(Category::Thought));
        assert_eq!(m2.sentiment, Sentiment::Neutral);
        assert_eq!(m2.size, DEFAULT_FACT_SIZE);
        assert!(m2.timestamp.is_none());
    }

    #[test]
    fn test_error_shaped_body() {
        match parse_graph_body(r#"{"detail": "Not Found"}"#) {
            Err(GardenError::ErrorResponse(msg)) => assert_eq!(msg, "Not Found"),
            other => panic!("expected error response, got {:?}", other),
        }
        assert!(matches!(parse_graph_body("[1,2]"), Err(GardenError::ErrorResponse(_))));
        assert!(matches!(parse_graph_body("not json"), Err(GardenError::Json(_))));
    }

    #[test]
    fn test_empty_bodies_are_empty_graphs() {
        for body in ["", "null", "{}", r#"{"nodes": [], "links": []}"#] {
            let payload = parse_graph_body(body).unwrap();
            assert!(payload.nodes.is_empty());
            assert!(payload.links.is_empty());
        }
    }

    #[test]
    fn test_malformed_node_is_skipped_not_fatal() {
        let body = r#"{"nodes": [
            {"id": "m1", "type": "fact", "label": "ok"},
            {"id": 7, "type": "fact"},
            {"id": "x", "type": "planet"}
        ], "links": [{"source": "m1"}]}"#;
        let data = GraphData::from_payload(parse_graph_body(body).unwrap());
        assert_eq!(data.nodes.len(), 1);
        assert_eq!(data.links.len(), 1);
        assert_eq!(data.resolved_links().count(), 0);
    }

    #[test]
    fn test_hub_label_defaults_from_id() {
        let body = r#"{"nodes": [{"id": "cat-preference", "type": "category"}]}"#;
        let data = GraphData::from_payload(parse_graph_body(body).unwrap());
        let hub = data.get("cat-preference").unwrap();
        assert_eq!(hub.label, "Preference");
        assert_eq!(hub.category, Some(Category::Preference));
        assert_eq!(hub.size, DEFAULT_HUB_SIZE);
    }

    #[test]
    fn test_naive_timestamp_is_utc() {
        let ts = parse_timestamp(Some("2024-05-01T10:00:00")).unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-05-01T10:00:00+00:00");
        assert!(parse_timestamp(Some("yesterday")).is_none());
    }
}
