//! Core types for the locator system

use live_dom::NodeId;
use noteanchor_core_types::{AnnotationId, Point};
use serde::{Deserialize, Serialize};

use crate::errors::LocatorError;

/// Persistent, serializable record of one anchored element.
///
/// The JSON field names are a persisted format; stored descriptors written by
/// earlier sessions must keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    pub id: AnnotationId,
    pub selector: String,
    pub element_context: ElementContext,
    #[serde(default)]
    pub parent_chain: Vec<ParentChainEntry>,
}

/// Facts about the element itself, captured at anchoring time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementContext {
    pub tag: String,
    /// Stable classes only, capped.
    #[serde(default)]
    pub classes: Vec<String>,
    /// Normalized text sample.
    #[serde(default)]
    pub text: String,
    /// Page-space top-left corner at capture time.
    #[serde(default)]
    pub position: Point,
}

/// One ancestor level, outermost first; the innermost entry is the direct
/// parent of the anchored element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentChainEntry {
    pub tag: String,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub text: String,
}

impl Descriptor {
    pub fn from_json(json: &str) -> Result<Self, LocatorError> {
        let descriptor: Descriptor = serde_json::from_str(json)?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    pub fn to_json(&self) -> Result<String, LocatorError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject descriptors that cannot drive any strategy.
    pub fn validate(&self) -> Result<(), LocatorError> {
        if self.id.as_str().trim().is_empty() {
            return Err(LocatorError::InvalidDescriptor("empty id".to_string()));
        }
        if self.element_context.tag.trim().is_empty() {
            return Err(LocatorError::InvalidDescriptor(format!(
                "descriptor {} has an empty tag",
                self.id
            )));
        }
        Ok(())
    }
}

/// Locator strategy enumeration, in cascade order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocatorStrategy {
    /// Element previously tagged with the annotation id in this document
    IdentityMark,

    /// The stored selector
    Selector,

    /// Rebuilt ancestor chain, then tag/class/text at the target level
    ParentChain,

    /// Tag plus punctuation-insensitive text
    TextContent,

    /// Tag plus stored stable classes
    StableClass,

    /// Nearest same-tag element to the recorded position
    Position,
}

impl LocatorStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            LocatorStrategy::IdentityMark => "identity-mark",
            LocatorStrategy::Selector => "selector",
            LocatorStrategy::ParentChain => "parent-chain",
            LocatorStrategy::TextContent => "text-content",
            LocatorStrategy::StableClass => "stable-class",
            LocatorStrategy::Position => "position",
        }
    }

    /// Cascade position, 0-based.
    pub fn index(&self) -> usize {
        match self {
            LocatorStrategy::IdentityMark => 0,
            LocatorStrategy::Selector => 1,
            LocatorStrategy::ParentChain => 2,
            LocatorStrategy::TextContent => 3,
            LocatorStrategy::StableClass => 4,
            LocatorStrategy::Position => 5,
        }
    }

    /// Get all strategies in fallback order
    pub fn fallback_chain() -> Vec<LocatorStrategy> {
        vec![
            LocatorStrategy::IdentityMark,
            LocatorStrategy::Selector,
            LocatorStrategy::ParentChain,
            LocatorStrategy::TextContent,
            LocatorStrategy::StableClass,
            LocatorStrategy::Position,
        ]
    }
}

/// Outcome of one cascade tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierOutcome {
    Resolved(NodeId),
    /// The tier produced no single answer; `candidates` is how many it saw.
    Miss { candidates: usize },
}

impl TierOutcome {
    pub fn miss() -> Self {
        TierOutcome::Miss { candidates: 0 }
    }
}

/// A successful locate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub node: NodeId,
    pub strategy: LocatorStrategy,
    /// Replacement selector when the stored one is no longer a durable,
    /// unique match for the resolved element.
    pub upgraded_selector: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_descriptor_json_field_names() {
        let descriptor = Descriptor {
            id: AnnotationId::from("note-1"),
            selector: "div.card".to_string(),
            element_context: ElementContext {
                tag: "div".to_string(),
                classes: vec!["card".to_string()],
                text: "Alpha".to_string(),
                position: Point::new(10.0, 20.0),
            },
            parent_chain: vec![ParentChainEntry {
                tag: "section".to_string(),
                classes: vec![],
                id: Some("main".to_string()),
                role: None,
                text: "Alpha Beta".to_string(),
            }],
        };

        let value = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(value["id"], "note-1");
        assert_eq!(value["elementContext"]["position"]["x"], 10.0);
        assert_eq!(value["parentChain"][0]["id"], "main");
        assert!(value["parentChain"][0].get("role").is_none());
    }

    #[test]
    fn test_descriptor_minimal_json() {
        let descriptor: Descriptor = serde_json::from_value(json!({
            "id": "n",
            "selector": "p",
            "elementContext": {"tag": "p"}
        }))
        .unwrap();
        assert!(descriptor.parent_chain.is_empty());
        assert_eq!(descriptor.element_context.position, Point::default());
    }

    #[test]
    fn test_validate_rejects_empty_tag() {
        let err = Descriptor::from_json(
            r#"{"id": "n", "selector": "p", "elementContext": {"tag": " "}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, LocatorError::InvalidDescriptor(_)));
        assert!(err.is_input_error());
    }

    #[test]
    fn test_fallback_chain_order() {
        let chain = LocatorStrategy::fallback_chain();
        assert_eq!(chain.first(), Some(&LocatorStrategy::IdentityMark));
        assert_eq!(chain.last(), Some(&LocatorStrategy::Position));
        for (i, strategy) in chain.iter().enumerate() {
            assert_eq!(strategy.index(), i);
        }
    }
}
