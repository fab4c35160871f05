//! Candidate narrowing shared by the cascade tiers.
//!
//! Every helper either reduces to exactly one node or reports a miss; none of
//! them picks arbitrarily among equals.

use live_dom::{Document, NodeId, Point};
use tracing::trace;

use crate::policy::LocatorPolicy;
use crate::types::ElementContext;

/// Exact text equality first, then proximity.
pub fn disambiguate(
    doc: &Document,
    candidates: &[NodeId],
    context: &ElementContext,
    policy: &LocatorPolicy,
) -> Option<NodeId> {
    let mut pool = candidates.to_vec();
    if !context.text.is_empty() {
        let exact = exact_text_matches(doc, candidates, &context.text, policy);
        match exact.len() {
            1 => return exact.first().copied(),
            0 => {}
            _ => pool = exact,
        }
    }
    nearest_within_tolerance(doc, &pool, context.position, policy.position_tolerance)
}

pub fn exact_text_matches(
    doc: &Document,
    candidates: &[NodeId],
    text: &str,
    policy: &LocatorPolicy,
) -> Vec<NodeId> {
    candidates
        .iter()
        .copied()
        .filter(|node| doc.text_sample(*node, policy.text_sample_chars) == text)
        .collect()
}

/// The single candidate strictly nearest to `target` within `tolerance`
/// (inclusive). Ties at the minimum distance are a miss.
pub fn nearest_within_tolerance(
    doc: &Document,
    candidates: &[NodeId],
    target: Point,
    tolerance: f64,
) -> Option<NodeId> {
    let mut best: Option<(NodeId, f64)> = None;
    let mut tied = false;
    for node in candidates {
        let Some(rect) = doc.rect(*node) else {
            continue;
        };
        let distance = rect.top_left().distance_to(&target);
        if distance > tolerance {
            continue;
        }
        match best {
            Some((_, best_distance)) if distance > best_distance => {}
            Some((_, best_distance)) if distance == best_distance => tied = true,
            _ => {
                best = Some((*node, distance));
                tied = false;
            }
        }
    }
    if tied {
        trace!(candidates = candidates.len(), "proximity tie");
        return None;
    }
    best.map(|(node, _)| node)
}

/// Candidates sharing at least one class with `classes`.
pub fn class_overlap(doc: &Document, candidates: &[NodeId], classes: &[String]) -> Vec<NodeId> {
    candidates
        .iter()
        .copied()
        .filter(|node| {
            let live = doc.classes(*node);
            classes.iter().any(|class| live.contains(&class.as_str()))
        })
        .collect()
}
