//! Tunables for capture, locating and signature matching.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorPolicy {
    /// Maximum distance (px, inclusive) for position-based disambiguation.
    pub position_tolerance: f64,
    /// Characters kept in the element text sample.
    pub text_sample_chars: usize,
    /// Characters kept in each parent-chain entry's text.
    pub parent_text_chars: usize,
    /// Stable classes kept in the element context.
    pub max_context_classes: usize,
    /// Ancestor levels recorded in the parent chain.
    pub parent_chain_depth: usize,
}

impl Default for LocatorPolicy {
    fn default() -> Self {
        Self {
            position_tolerance: 30.0,
            text_sample_chars: 100,
            parent_text_chars: 50,
            max_context_classes: 5,
            parent_chain_depth: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignaturePolicy {
    /// Similarity must exceed this value to count as a structural match.
    pub similarity_threshold: f64,
    /// Characters kept in the signature's text sample.
    pub text_chars: usize,
    /// Characters kept in the markup snippet.
    pub markup_chars: usize,
    /// Prefix length used by the text tier and by `matches`.
    pub text_prefix_chars: usize,
}

impl Default for SignaturePolicy {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.8,
            text_chars: 200,
            markup_chars: 300,
            text_prefix_chars: 50,
        }
    }
}
