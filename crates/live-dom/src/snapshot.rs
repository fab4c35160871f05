//! JSON DOM snapshots.
//!
//! A snapshot is the serialized form a host hands over for one rendered
//! document: the viewport plus an element tree whose nodes carry their
//! page-space rectangles. Loading a snapshot always yields a fresh document
//! generation, which is how a reload is modelled.

use std::collections::BTreeMap;

use noteanchor_core_types::{Rect, Viewport};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::{Document, NodeId};
use crate::errors::DomError;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DomSnapshot {
    #[serde(default)]
    pub viewport: Viewport,
    pub root: SnapshotNode,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotNode {
    Element(SnapshotElement),
    Text { text: String },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SnapshotElement {
    pub tag: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    #[serde(default)]
    pub rect: Rect,
    /// Shorthand for a leading text child.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SnapshotNode>,
}

impl Document {
    pub fn from_snapshot(snapshot: &DomSnapshot) -> Result<Self, DomError> {
        let SnapshotNode::Element(root) = &snapshot.root else {
            return Err(DomError::Snapshot(
                "snapshot root must be an element".to_string(),
            ));
        };
        let mut doc = Document::new(&root.tag, snapshot.viewport);
        let root_id = doc.root();
        doc.fill_element(root_id, root)?;
        debug!(
            generation = %doc.generation(),
            nodes = doc.node_count(),
            "document loaded from snapshot"
        );
        Ok(doc)
    }

    pub fn from_json(json: &str) -> Result<Self, DomError> {
        let snapshot: DomSnapshot = serde_json::from_str(json)?;
        Self::from_snapshot(&snapshot)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, DomError> {
        let snapshot: DomSnapshot = serde_json::from_value(value)?;
        Self::from_snapshot(&snapshot)
    }

    fn fill_element(&mut self, node: NodeId, spec: &SnapshotElement) -> Result<(), DomError> {
        if spec.tag.trim().is_empty() {
            return Err(DomError::Snapshot("element with empty tag".to_string()));
        }
        for (name, value) in &spec.attrs {
            self.set_attribute(node, name, value)?;
        }
        self.set_rect(node, spec.rect)?;
        if let Some(text) = &spec.text {
            self.append_text(node, text)?;
        }
        for child in &spec.children {
            match child {
                SnapshotNode::Text { text } => {
                    self.append_text(node, text)?;
                }
                SnapshotNode::Element(element) => {
                    let id = self.append_element(node, &element.tag)?;
                    self.fill_element(id, element)?;
                }
            }
        }
        Ok(())
    }
}
