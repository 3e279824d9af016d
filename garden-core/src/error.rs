//! Error types for the garden engine.

use thiserror::Error;

/// Recoverable failures. None of these stop the frame loop.
#[derive(Debug, Error)]
pub enum GardenError {
    /// The host's fetch failed before any body arrived.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// The backend answered with an error-shaped body.
    #[error("backend returned an error: {0}")]
    ErrorResponse(String),

    /// Body was not the JSON we expected.
    #[error("invalid payload: {0}")]
    Json(#[from] serde_json::Error),

    /// An id that is not part of the current layout.
    #[error("unknown node: {0}")]
    UnknownNode(String),

    /// A node that exists but cannot be selected (category hubs).
    #[error("node is not selectable: {0}")]
    NotSelectable(String),

    /// Canvas or 2D context could not be obtained.
    #[error("canvas error: {0}")]
    Canvas(String),
}

impl GardenError {
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    pub fn unknown_node(id: impl Into<String>) -> Self {
        Self::UnknownNode(id.into())
    }

    pub fn canvas(msg: impl Into<String>) -> Self {
        Self::Canvas(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, GardenError>;
