//! Output types for host consumption.
//!
//! These structs are serialized to JSON and handed to the page (side panel,
//! detail card) or the native shell.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::filter::FilterState;
use crate::interaction::CursorHint;
use crate::model::{Category, MemoryItem, NodeKind, Sentiment};

/// A node as currently laid out.
#[derive(Debug, Clone, Serialize)]
pub struct NodeOutput {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    pub sentiment: Sentiment,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

/// Detail card for the selected fact.
#[derive(Debug, Clone, Serialize)]
pub struct SelectionDetail {
    pub id: String,
    pub label: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    pub sentiment: Sentiment,
    /// RFC 3339, when the backend sent a usable timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Ids of nodes linked to this one.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub linked: Vec<String>,
}

/// One row of the side-panel list.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryRow {
    #[serde(flatten)]
    pub memory: MemoryItem,
    pub glyph: &'static str,
    pub selected: bool,
}

/// Filtered side-panel list plus counts for the filter pills.
#[derive(Debug, Clone, Serialize)]
pub struct FilteredMemoryOutput {
    pub filter: FilterState,
    pub total: usize,
    pub items: Vec<MemoryRow>,
    pub category_counts: BTreeMap<Category, usize>,
}

/// Everything the host needs to mirror the canvas state.
#[derive(Debug, Clone, Serialize)]
pub struct GardenSnapshot {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<NodeOutput>,
    pub link_count: usize,
    pub fact_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<SelectionDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovered: Option<String>,
    pub cursor: CursorHint,
    pub refresh_pending: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
