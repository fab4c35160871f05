//! Error types for the live document

use thiserror::Error;

use crate::document::NodeId;

#[derive(Debug, Error)]
pub enum DomError {
    /// Node id does not belong to this document
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    /// Operation requires an element but got a text node
    #[error("not an element: {0}")]
    NotAnElement(NodeId),

    /// Tree mutation would produce an invalid hierarchy
    #[error("hierarchy request error: {0}")]
    HierarchyRequest(String),

    /// Selector text could not be parsed
    #[error("invalid selector '{selector}'")]
    InvalidSelector { selector: String },

    /// Snapshot is structurally invalid
    #[error("invalid snapshot: {0}")]
    Snapshot(String),

    #[error("snapshot decode failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl DomError {
    pub fn invalid_selector(selector: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.into(),
        }
    }
}
