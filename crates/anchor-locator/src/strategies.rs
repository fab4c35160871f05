//! Locator strategies, one per cascade tier after the identity fast path.
//!
//! Each strategy is a pure function of the document, the descriptor and the
//! policy. The resolver runs them in [`LocatorStrategy::fallback_chain`] order.

use std::collections::HashSet;

use live_dom::{escape_identifier, strip_punctuation, Document, NodeId};
use tracing::debug;

use crate::classes::is_stable_class;
use crate::disambiguate::{
    class_overlap, disambiguate, exact_text_matches, nearest_within_tolerance,
};
use crate::policy::LocatorPolicy;
use crate::types::{Descriptor, LocatorStrategy, ParentChainEntry, TierOutcome};

/// Strategy trait for element resolution
pub trait Strategy: Send + Sync {
    /// Resolve the descriptor against the live document
    fn resolve(&self, doc: &Document, descriptor: &Descriptor, policy: &LocatorPolicy)
        -> TierOutcome;

    /// Get strategy type
    fn strategy_type(&self) -> LocatorStrategy;

    /// Get strategy name
    fn name(&self) -> &'static str {
        self.strategy_type().name()
    }
}

/// Tiers two to six, in cascade order.
pub fn default_chain() -> Vec<Box<dyn Strategy>> {
    vec![
        Box::new(SelectorStrategy),
        Box::new(ParentChainStrategy),
        Box::new(TextContentStrategy),
        Box::new(StableClassStrategy),
        Box::new(PositionStrategy),
    ]
}

fn settle(
    doc: &Document,
    candidates: Vec<NodeId>,
    descriptor: &Descriptor,
    policy: &LocatorPolicy,
) -> TierOutcome {
    match candidates.len() {
        0 => TierOutcome::miss(),
        1 => TierOutcome::Resolved(candidates[0]),
        count => match disambiguate(doc, &candidates, &descriptor.element_context, policy) {
            Some(node) => TierOutcome::Resolved(node),
            None => TierOutcome::Miss { candidates: count },
        },
    }
}

fn by_proximity(
    doc: &Document,
    candidates: &[NodeId],
    descriptor: &Descriptor,
    policy: &LocatorPolicy,
) -> TierOutcome {
    match nearest_within_tolerance(
        doc,
        candidates,
        descriptor.element_context.position,
        policy.position_tolerance,
    ) {
        Some(node) => TierOutcome::Resolved(node),
        None => TierOutcome::Miss {
            candidates: candidates.len(),
        },
    }
}

/// Runs the stored selector.
pub struct SelectorStrategy;

impl Strategy for SelectorStrategy {
    fn resolve(
        &self,
        doc: &Document,
        descriptor: &Descriptor,
        policy: &LocatorPolicy,
    ) -> TierOutcome {
        if descriptor.selector.trim().is_empty() {
            return TierOutcome::miss();
        }
        let hits = match doc.query_selector_all(&descriptor.selector) {
            Ok(hits) => hits,
            Err(err) => {
                debug!(selector = %descriptor.selector, error = %err, "stored selector unusable");
                return TierOutcome::miss();
            }
        };
        if let [single] = hits.as_slice() {
            let single = *single;
            if !Self::confirms(doc, single, descriptor, policy) {
                debug!(selector = %descriptor.selector, node = %single, "single hit contradicts context");
                return TierOutcome::Miss { candidates: 1 };
            }
        }
        settle(doc, hits, descriptor, policy)
    }

    fn strategy_type(&self) -> LocatorStrategy {
        LocatorStrategy::Selector
    }
}

impl SelectorStrategy {
    /// Positional selectors survive reordering but then point at a sibling;
    /// a lone hit must agree with the recorded tag and text.
    fn confirms(doc: &Document, node: NodeId, descriptor: &Descriptor, policy: &LocatorPolicy) -> bool {
        let context = &descriptor.element_context;
        if doc.tag(node) != Some(context.tag.as_str()) {
            return false;
        }
        if context.text.is_empty() {
            return true;
        }
        let live = doc.text_sample(node, policy.text_sample_chars);
        strip_punctuation(&live) == strip_punctuation(&context.text)
    }
}

/// Rebuilds the ancestor chain level by level, then filters the target level.
pub struct ParentChainStrategy;

impl ParentChainStrategy {
    fn entry_matches(doc: &Document, node: NodeId, entry: &ParentChainEntry) -> bool {
        if doc.tag(node) != Some(entry.tag.as_str()) {
            return false;
        }
        if let Some(id) = &entry.id {
            return doc.id_attr(node) == Some(id.as_str());
        }
        let live = doc.classes(node);
        entry
            .classes
            .iter()
            .all(|class| live.contains(&class.as_str()))
    }

    fn descendants_of(doc: &Document, scope: &[NodeId]) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        scope
            .iter()
            .flat_map(|node| doc.descendants(*node))
            .filter(|node| doc.is_element(*node) && seen.insert(*node))
            .collect()
    }
}

impl Strategy for ParentChainStrategy {
    fn resolve(
        &self,
        doc: &Document,
        descriptor: &Descriptor,
        policy: &LocatorPolicy,
    ) -> TierOutcome {
        let Some((outermost, inner)) = descriptor.parent_chain.split_first() else {
            return TierOutcome::miss();
        };

        let mut scope: Vec<NodeId> = doc
            .elements()
            .into_iter()
            .filter(|node| Self::entry_matches(doc, *node, outermost))
            .collect();
        for entry in inner {
            if scope.is_empty() {
                break;
            }
            scope = Self::descendants_of(doc, &scope)
                .into_iter()
                .filter(|node| Self::entry_matches(doc, *node, entry))
                .collect();
        }
        if scope.is_empty() {
            return TierOutcome::miss();
        }

        let context = &descriptor.element_context;
        let mut candidates: Vec<NodeId> = Self::descendants_of(doc, &scope)
            .into_iter()
            .filter(|node| doc.tag(*node) == Some(context.tag.as_str()))
            .collect();
        if !context.classes.is_empty() {
            candidates = class_overlap(doc, &candidates, &context.classes);
        }
        if !context.text.is_empty() {
            candidates = exact_text_matches(doc, &candidates, &context.text, policy);
        }
        settle(doc, candidates, descriptor, policy)
    }

    fn strategy_type(&self) -> LocatorStrategy {
        LocatorStrategy::ParentChain
    }
}

/// Same tag, same text once punctuation is ignored.
pub struct TextContentStrategy;

impl Strategy for TextContentStrategy {
    fn resolve(
        &self,
        doc: &Document,
        descriptor: &Descriptor,
        policy: &LocatorPolicy,
    ) -> TierOutcome {
        let context = &descriptor.element_context;
        let wanted = strip_punctuation(&context.text);
        if wanted.is_empty() {
            return TierOutcome::miss();
        }
        let candidates: Vec<NodeId> = doc
            .elements_by_tag(&context.tag)
            .into_iter()
            .filter(|node| {
                strip_punctuation(&doc.text_sample(*node, policy.text_sample_chars)) == wanted
            })
            .collect();
        match candidates.len() {
            0 => TierOutcome::miss(),
            1 => TierOutcome::Resolved(candidates[0]),
            _ => {
                let overlapping = class_overlap(doc, &candidates, &context.classes);
                match overlapping.len() {
                    1 => TierOutcome::Resolved(overlapping[0]),
                    0 => by_proximity(doc, &candidates, descriptor, policy),
                    _ => by_proximity(doc, &overlapping, descriptor, policy),
                }
            }
        }
    }

    fn strategy_type(&self) -> LocatorStrategy {
        LocatorStrategy::TextContent
    }
}

/// `tag.class1.class2…` over the recorded stable classes.
pub struct StableClassStrategy;

impl StableClassStrategy {
    fn selector(descriptor: &Descriptor) -> Option<String> {
        let context = &descriptor.element_context;
        let mut selector = context.tag.clone();
        let mut any = false;
        for class in context.classes.iter().filter(|c| is_stable_class(c)) {
            selector.push('.');
            selector.push_str(&escape_identifier(class)?);
            any = true;
        }
        any.then_some(selector)
    }
}

impl Strategy for StableClassStrategy {
    fn resolve(
        &self,
        doc: &Document,
        descriptor: &Descriptor,
        policy: &LocatorPolicy,
    ) -> TierOutcome {
        let Some(selector) = Self::selector(descriptor) else {
            return TierOutcome::miss();
        };
        let hits = doc.query_selector_all(&selector).unwrap_or_default();
        match hits.len() {
            0 => TierOutcome::miss(),
            1 => TierOutcome::Resolved(hits[0]),
            _ => by_proximity(doc, &hits, descriptor, policy),
        }
    }

    fn strategy_type(&self) -> LocatorStrategy {
        LocatorStrategy::StableClass
    }
}

/// Nearest element of the recorded tag.
pub struct PositionStrategy;

impl Strategy for PositionStrategy {
    fn resolve(
        &self,
        doc: &Document,
        descriptor: &Descriptor,
        policy: &LocatorPolicy,
    ) -> TierOutcome {
        let candidates = doc.elements_by_tag(&descriptor.element_context.tag);
        if candidates.is_empty() {
            return TierOutcome::miss();
        }
        by_proximity(doc, &candidates, descriptor, policy)
    }

    fn strategy_type(&self) -> LocatorStrategy {
        LocatorStrategy::Position
    }
}
