//! Selector generation.
//!
//! Produces the most durable selector that uniquely identifies an element:
//! its identifier, then a tag plus stable-class combination, then a
//! positional path. Never fails.

use live_dom::{escape_identifier, Document, NodeId};
use tracing::{trace, warn};

use crate::classes::{is_stable_identifier, stable_classes};

pub fn generate(doc: &Document, node: NodeId) -> String {
    let Some(tag) = doc.tag(node) else {
        warn!(%node, "selector requested for a non-element node");
        return String::new();
    };

    if let Some(selector) = id_selector(doc, node) {
        trace!(%node, %selector, "selector from identifier");
        return selector;
    }

    if let Some(selector) = class_selector(doc, node, tag) {
        trace!(%node, %selector, "selector from stable classes");
        return selector;
    }

    let selector = positional_selector(doc, node);
    trace!(%node, %selector, "positional selector");
    selector
}

/// `#id` when the identifier is stable, escapable and unique.
fn id_selector(doc: &Document, node: NodeId) -> Option<String> {
    let id = doc.id_attr(node)?;
    if !is_stable_identifier(id) {
        return None;
    }
    let escaped = escape_identifier(id)?;
    let selector = format!("#{escaped}");
    is_unique_match(doc, &selector, node).then_some(selector)
}

fn class_selector(doc: &Document, node: NodeId, tag: &str) -> Option<String> {
    let classes = stable_classes(doc, node);
    let mut selector = tag.to_string();
    for class in &classes {
        // Unescapable class: leave it to the positional path.
        let escaped = escape_identifier(class)?;
        selector.push('.');
        selector.push_str(&escaped);
        if is_unique_match(doc, &selector, node) {
            return Some(selector);
        }
    }
    None
}

fn positional_selector(doc: &Document, node: NodeId) -> String {
    let mut segments = Vec::new();
    let mut current = node;
    loop {
        let Some(tag) = doc.tag(current) else {
            break;
        };
        if current != node {
            if let Some(selector) = id_selector(doc, current) {
                segments.push(selector);
                break;
            }
        }
        let Some(parent) = doc.parent(current) else {
            // Anchored so the same tag chain deeper in the tree cannot match.
            segments.push(format!("{tag}:root"));
            break;
        };
        match doc.nth_of_type(current) {
            Some((index, count)) if count > 1 => {
                segments.push(format!("{tag}:nth-of-type({index})"));
            }
            _ => segments.push(tag.to_string()),
        }
        current = parent;
    }
    segments.reverse();
    segments.join(" > ")
}

fn is_unique_match(doc: &Document, selector: &str, node: NodeId) -> bool {
    match doc.query_selector_all(selector) {
        Ok(hits) => hits.len() == 1 && hits[0] == node,
        Err(_) => false,
    }
}
