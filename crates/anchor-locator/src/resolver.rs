//! Element resolver with fallback chain orchestration

use std::time::Instant;

use live_dom::{Document, NodeId};
use noteanchor_core_types::AnnotationId;
use tracing::{debug, info, warn};

use crate::classes::is_durable_selector;
use crate::generator::generate;
use crate::identity::IdentityMarks;
use crate::metrics;
use crate::policy::LocatorPolicy;
use crate::strategies::{default_chain, Strategy};
use crate::types::{Descriptor, LocatorStrategy, Resolution, TierOutcome};

/// Re-locates anchored elements in a live document.
///
/// Holds the identity marks for the document it last saw; handing it a
/// document from a new generation invalidates them.
pub struct ElementLocator {
    policy: LocatorPolicy,
    marks: IdentityMarks,
    chain: Vec<Box<dyn Strategy>>,
}

impl Default for ElementLocator {
    fn default() -> Self {
        Self::new(LocatorPolicy::default())
    }
}

impl ElementLocator {
    pub fn new(policy: LocatorPolicy) -> Self {
        Self::with_chain(policy, default_chain())
    }

    /// Build a locator with a custom tier chain. The identity fast path
    /// always runs first.
    pub fn with_chain(policy: LocatorPolicy, chain: Vec<Box<dyn Strategy>>) -> Self {
        Self {
            policy,
            marks: IdentityMarks::new(),
            chain,
        }
    }

    pub fn policy(&self) -> &LocatorPolicy {
        &self.policy
    }

    pub fn marks(&self) -> &IdentityMarks {
        &self.marks
    }

    /// Drop the identity mark of a deleted annotation.
    pub fn forget(&mut self, id: &AnnotationId) {
        self.marks.forget(id);
    }

    pub fn reset(&mut self) {
        self.marks.clear();
    }

    /// Resolve `descriptor` against `doc`. `None` is the expected outcome
    /// when every tier misses.
    pub fn locate(&mut self, doc: &Document, descriptor: &Descriptor) -> Option<Resolution> {
        let started = Instant::now();
        let resolution = self.run_cascade(doc, descriptor);
        metrics::record_locate(resolution.as_ref().map(|r| r.strategy), started.elapsed());
        resolution
    }

    /// Like [`locate`](Self::locate), and writes an upgraded selector back
    /// into the descriptor.
    pub fn locate_and_upgrade(
        &mut self,
        doc: &Document,
        descriptor: &mut Descriptor,
    ) -> Option<Resolution> {
        let resolution = self.locate(doc, descriptor)?;
        if let Some(selector) = &resolution.upgraded_selector {
            info!(
                id = %descriptor.id,
                from = %descriptor.selector,
                to = %selector,
                "descriptor selector upgraded"
            );
            descriptor.selector = selector.clone();
        }
        Some(resolution)
    }

    fn run_cascade(&mut self, doc: &Document, descriptor: &Descriptor) -> Option<Resolution> {
        if let Err(err) = descriptor.validate() {
            warn!(error = %err, "skipping invalid descriptor");
            return None;
        }

        if let Some(node) = self.marks.lookup(doc, &descriptor.id) {
            debug!(id = %descriptor.id, %node, "resolved from identity mark");
            return Some(Resolution {
                node,
                strategy: LocatorStrategy::IdentityMark,
                upgraded_selector: None,
            });
        }

        for strategy in &self.chain {
            match strategy.resolve(doc, descriptor, &self.policy) {
                TierOutcome::Resolved(node) => {
                    self.marks.mark(doc, &descriptor.id, node);
                    let upgraded_selector = selector_upgrade(doc, descriptor, node);
                    info!(
                        id = %descriptor.id,
                        strategy = strategy.name(),
                        %node,
                        "anchor resolved"
                    );
                    return Some(Resolution {
                        node,
                        strategy: strategy.strategy_type(),
                        upgraded_selector,
                    });
                }
                TierOutcome::Miss { candidates } => {
                    debug!(
                        id = %descriptor.id,
                        strategy = strategy.name(),
                        candidates,
                        "tier missed"
                    );
                }
            }
        }

        info!(id = %descriptor.id, "anchor not found");
        None
    }
}

/// A fresh selector when the stored one is non-durable or no longer selects
/// exactly `node`.
fn selector_upgrade(doc: &Document, descriptor: &Descriptor, node: NodeId) -> Option<String> {
    let still_unique = doc
        .query_selector_all(&descriptor.selector)
        .map(|hits| hits == [node])
        .unwrap_or(false);
    if still_unique && is_durable_selector(&descriptor.selector) {
        return None;
    }
    let fresh = generate(doc, node);
    (!fresh.is_empty() && fresh != descriptor.selector).then_some(fresh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::capture;
    use live_dom::{Rect, Viewport};

    fn two_cards() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new("html", Viewport::default());
        let body = doc.append_element(doc.root(), "body").unwrap();
        let alpha = doc.append_element(body, "div").unwrap();
        doc.set_classes(alpha, &["card"]).unwrap();
        doc.append_text(alpha, "Alpha").unwrap();
        doc.set_rect(alpha, Rect::new(0.0, 0.0, 200.0, 80.0)).unwrap();
        let beta = doc.append_element(body, "div").unwrap();
        doc.set_classes(beta, &["card"]).unwrap();
        doc.append_text(beta, "Beta").unwrap();
        doc.set_rect(beta, Rect::new(0.0, 100.0, 200.0, 80.0)).unwrap();
        (doc, alpha, beta)
    }

    #[test]
    fn test_second_locate_uses_identity_mark() {
        let (doc, _, beta) = two_cards();
        let descriptor =
            capture(&doc, beta, AnnotationId::from("b"), &LocatorPolicy::default()).unwrap();
        let mut locator = ElementLocator::default();

        let first = locator.locate(&doc, &descriptor).unwrap();
        assert_eq!(first.node, beta);
        assert_eq!(first.strategy, LocatorStrategy::Selector);

        let second = locator.locate(&doc, &descriptor).unwrap();
        assert_eq!(second.node, beta);
        assert_eq!(second.strategy, LocatorStrategy::IdentityMark);
    }

    #[test]
    fn test_invalid_descriptor_is_not_found() {
        let (doc, _, beta) = two_cards();
        let mut descriptor =
            capture(&doc, beta, AnnotationId::from("b"), &LocatorPolicy::default()).unwrap();
        descriptor.element_context.tag.clear();
        let mut locator = ElementLocator::default();
        assert!(locator.locate(&doc, &descriptor).is_none());
    }

    #[test]
    fn test_non_unique_selector_is_upgraded() {
        let (doc, _, beta) = two_cards();
        let mut descriptor =
            capture(&doc, beta, AnnotationId::from("b"), &LocatorPolicy::default()).unwrap();
        descriptor.selector = "div.card".to_string();

        let mut locator = ElementLocator::default();
        let resolution = locator.locate_and_upgrade(&doc, &mut descriptor).unwrap();
        assert_eq!(resolution.node, beta);
        assert_eq!(resolution.strategy, LocatorStrategy::Selector);
        assert_eq!(descriptor.selector, "html:root > body > div:nth-of-type(2)");
    }

    #[test]
    fn test_durable_unique_selector_is_kept() {
        let (doc, _, beta) = two_cards();
        let descriptor =
            capture(&doc, beta, AnnotationId::from("b"), &LocatorPolicy::default()).unwrap();
        let mut locator = ElementLocator::default();
        let resolution = locator.locate(&doc, &descriptor).unwrap();
        assert_eq!(resolution.upgraded_selector, None);
    }

    #[test]
    fn test_empty_chain_only_uses_marks() {
        let (doc, _, beta) = two_cards();
        let descriptor =
            capture(&doc, beta, AnnotationId::from("b"), &LocatorPolicy::default()).unwrap();
        let mut locator = ElementLocator::with_chain(LocatorPolicy::default(), Vec::new());
        assert!(locator.locate(&doc, &descriptor).is_none());
        assert!(locator.marks().is_empty());
    }
}
