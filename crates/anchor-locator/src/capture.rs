//! Descriptor capture at anchoring time.

use live_dom::{Document, NodeId};
use noteanchor_core_types::AnnotationId;
use tracing::debug;

use crate::classes::{is_stable_identifier, stable_classes};
use crate::errors::LocatorError;
use crate::generator::generate;
use crate::policy::LocatorPolicy;
use crate::types::{Descriptor, ElementContext, ParentChainEntry};

/// Ancestors at or above these tags are not recorded in the parent chain.
const CHAIN_STOP_TAGS: &[&str] = &["body", "html"];

pub fn capture(
    doc: &Document,
    node: NodeId,
    id: AnnotationId,
    policy: &LocatorPolicy,
) -> Result<Descriptor, LocatorError> {
    let Some(element) = doc.element(node) else {
        return Err(LocatorError::NotAnElement(node.to_string()));
    };

    let element_context = ElementContext {
        tag: element.tag().to_string(),
        classes: capped(stable_classes(doc, node), policy.max_context_classes),
        text: doc.text_sample(node, policy.text_sample_chars),
        position: element.rect().top_left(),
    };

    let mut parent_chain: Vec<ParentChainEntry> = doc
        .ancestors(node)
        .into_iter()
        .take_while(|ancestor| {
            doc.tag(*ancestor)
                .map(|tag| !CHAIN_STOP_TAGS.contains(&tag))
                .unwrap_or(false)
        })
        .take(policy.parent_chain_depth)
        .map(|ancestor| chain_entry(doc, ancestor, policy))
        .collect();
    parent_chain.reverse();

    let descriptor = Descriptor {
        id,
        selector: generate(doc, node),
        element_context,
        parent_chain,
    };
    debug!(
        id = %descriptor.id,
        selector = %descriptor.selector,
        depth = descriptor.parent_chain.len(),
        "descriptor captured"
    );
    Ok(descriptor)
}

fn chain_entry(doc: &Document, node: NodeId, policy: &LocatorPolicy) -> ParentChainEntry {
    ParentChainEntry {
        tag: doc.tag(node).unwrap_or_default().to_string(),
        classes: capped(stable_classes(doc, node), policy.max_context_classes),
        id: doc
            .id_attr(node)
            .filter(|id| is_stable_identifier(id))
            .map(str::to_string),
        role: doc.attribute(node, "role").map(str::to_string),
        text: doc.text_sample(node, policy.parent_text_chars),
    }
}

fn capped(mut classes: Vec<String>, max: usize) -> Vec<String> {
    classes.truncate(max);
    classes
}

#[cfg(test)]
mod tests {
    use super::*;
    use live_dom::{Rect, Viewport};

    #[test]
    fn test_capture_records_context_and_chain() {
        let mut doc = Document::new("html", Viewport::default());
        let body = doc.append_element(doc.root(), "body").unwrap();
        let main = doc.append_element(body, "main").unwrap();
        doc.set_attribute(main, "role", "main").unwrap();
        let article = doc.append_element(main, "article").unwrap();
        doc.set_attribute(article, "id", "post").unwrap();
        doc.set_classes(article, &["post", "css-x9y8z7"]).unwrap();
        let p = doc.append_element(article, "p").unwrap();
        doc.set_classes(p, &["lead", "a", "b", "c", "d", "e", "hover"])
            .unwrap();
        doc.append_text(p, "  First   paragraph ").unwrap();
        doc.set_rect(p, Rect::new(40.0, 300.0, 200.0, 20.0)).unwrap();

        let descriptor =
            capture(&doc, p, AnnotationId::from("n1"), &LocatorPolicy::default()).unwrap();

        assert_eq!(descriptor.element_context.tag, "p");
        assert_eq!(
            descriptor.element_context.classes,
            vec!["lead", "a", "b", "c", "d"]
        );
        assert_eq!(descriptor.element_context.text, "First paragraph");
        assert_eq!(descriptor.element_context.position.y, 300.0);

        let tags: Vec<&str> = descriptor
            .parent_chain
            .iter()
            .map(|entry| entry.tag.as_str())
            .collect();
        assert_eq!(tags, vec!["main", "article"]);
        assert_eq!(descriptor.parent_chain[0].role.as_deref(), Some("main"));
        assert_eq!(descriptor.parent_chain[1].id.as_deref(), Some("post"));
        assert_eq!(descriptor.parent_chain[1].classes, vec!["post"]);
        assert_eq!(doc.query_selector_all(&descriptor.selector).unwrap(), vec![p]);
    }

    #[test]
    fn test_chain_depth_is_capped() {
        let mut doc = Document::new("html", Viewport::default());
        let mut parent = doc.append_element(doc.root(), "body").unwrap();
        for _ in 0..5 {
            parent = doc.append_element(parent, "div").unwrap();
        }
        let leaf = doc.append_element(parent, "span").unwrap();
        let descriptor =
            capture(&doc, leaf, AnnotationId::from("n"), &LocatorPolicy::default()).unwrap();
        assert_eq!(descriptor.parent_chain.len(), 3);
    }

    #[test]
    fn test_capture_rejects_text_nodes() {
        let mut doc = Document::new("html", Viewport::default());
        let text = doc.append_text(doc.root(), "x").unwrap();
        let err = capture(&doc, text, AnnotationId::from("n"), &LocatorPolicy::default())
            .unwrap_err();
        assert!(matches!(err, LocatorError::NotAnElement(_)));
    }
}
