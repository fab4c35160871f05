//! File helpers shared by the engine commands.

use std::path::Path;

use anchor_locator::Descriptor;
use anyhow::{anyhow, Context, Result};
use live_dom::{Document, NodeId, Rect};
use serde::Serialize;
use tokio::fs;
use tracing::debug;

pub async fn read_document(path: &Path) -> Result<Document> {
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let doc = Document::from_json(&raw).with_context(|| format!("parsing {}", path.display()))?;
    debug!(path = %path.display(), nodes = doc.node_count(), "document snapshot loaded");
    Ok(doc)
}

pub async fn read_descriptor(path: &Path) -> Result<Descriptor> {
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    Descriptor::from_json(&raw).with_context(|| format!("parsing {}", path.display()))
}

/// Reads a JSON array of descriptors.
pub async fn read_descriptors(path: &Path) -> Result<Vec<Descriptor>> {
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let descriptors: Vec<Descriptor> =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    for descriptor in &descriptors {
        descriptor
            .validate()
            .with_context(|| format!("descriptor {} in {}", descriptor.id, path.display()))?;
    }
    Ok(descriptors)
}

pub async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let serialized = serde_json::to_string_pretty(value)?;
    fs::write(path, serialized)
        .await
        .with_context(|| format!("writing {}", path.display()))
}

/// First element matching `selector`, as an error when nothing matches.
pub fn select_target(doc: &Document, selector: &str) -> Result<NodeId> {
    doc.query_selector(selector)
        .with_context(|| format!("invalid target selector {selector:?}"))?
        .ok_or_else(|| anyhow!("no element matches {selector:?}"))
}

/// Compact element view used in command reports.
#[derive(Debug, Clone, Serialize)]
pub struct ElementSummary {
    pub node: usize,
    pub tag: String,
    pub text: String,
    pub rect: Rect,
}

impl ElementSummary {
    pub fn of(doc: &Document, node: NodeId) -> Self {
        Self {
            node: node.index(),
            tag: doc.tag(node).unwrap_or_default().to_string(),
            text: doc.text_sample(node, 60),
            rect: doc.rect(node).unwrap_or_default(),
        }
    }

    pub fn describe(&self) -> String {
        if self.text.is_empty() {
            format!("<{}> at ({}, {})", self.tag, self.rect.x, self.rect.y)
        } else {
            format!(
                "<{}> \"{}\" at ({}, {})",
                self.tag, self.text, self.rect.x, self.rect.y
            )
        }
    }
}
