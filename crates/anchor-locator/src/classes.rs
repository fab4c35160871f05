//! Transient-class heuristics.
//!
//! Classes that change between renders (framework hashes, responsive utility
//! variants, interaction states, our own markers) make poor anchors.

use live_dom::{Document, NodeId};
use once_cell::sync::Lazy;
use regex::Regex;

/// Prefix of every class this subsystem injects into host pages.
pub const TOOL_CLASS_PREFIX: &str = "noteanchor-";

static FRAMEWORK_HASH_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(css|sc|jsx|svelte|emotion)-").expect("valid regex"));

static STATE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(is|has)-").expect("valid regex"));

/// Class tokens in a selector string; escaped tokens are not extracted.
static SELECTOR_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.(-?[_a-zA-Z][_a-zA-Z0-9-]*)").expect("valid regex"));

const STATE_TOKENS: &[&str] = &[
    "active", "hover", "focus", "focused", "selected", "open", "visible", "hidden",
];

const UTILITY_CHARS: &[char] = &[':', '[', ']', '/', '.', '!', '@'];

pub fn is_stable_class(class: &str) -> bool {
    if class.is_empty() || class.starts_with(TOOL_CLASS_PREFIX) {
        return false;
    }
    if FRAMEWORK_HASH_PREFIX.is_match(class) || STATE_PREFIX.is_match(class) {
        return false;
    }
    if class.contains(UTILITY_CHARS) || STATE_TOKENS.contains(&class) {
        return false;
    }
    !has_hash_segment(class)
}

/// Identifiers generated by frameworks (`:r1:`, `ember1234`) or by us.
pub fn is_stable_identifier(id: &str) -> bool {
    if id.is_empty() || id.starts_with(TOOL_CLASS_PREFIX) {
        return false;
    }
    if id.len() > 1 && id.starts_with(':') && id.ends_with(':') {
        return false;
    }
    !has_hash_segment(id)
}

fn has_hash_segment(token: &str) -> bool {
    token
        .split(['-', '_'])
        .any(|segment| is_hash_like(segment))
}

/// Interleaved letters and digits (`a1b2c`) or a long numeric run
/// (`ember1234`). A short trailing number (`step2`, `grid12`) is a name.
fn is_hash_like(segment: &str) -> bool {
    let len = segment.chars().count();
    let digits = segment.chars().filter(|c| c.is_ascii_digit()).count();
    let letters = segment.chars().filter(|c| c.is_ascii_alphabetic()).count();
    if digits == len && len >= 4 {
        return true;
    }
    if len < 5 || digits == 0 || letters == 0 {
        return false;
    }
    let kinds: Vec<bool> = segment.chars().map(|c| c.is_ascii_digit()).collect();
    let switches = kinds.windows(2).filter(|pair| pair[0] != pair[1]).count();
    switches >= 2 || digits >= 4
}

/// The element's stable classes, in document order.
pub fn stable_classes(doc: &Document, node: NodeId) -> Vec<String> {
    doc.classes(node)
        .into_iter()
        .filter(|class| is_stable_class(class))
        .map(str::to_string)
        .collect()
}

/// A selector is durable unless it references an injected or hash-like class.
pub fn is_durable_selector(selector: &str) -> bool {
    if selector.contains(TOOL_CLASS_PREFIX) {
        return false;
    }
    SELECTOR_CLASS
        .captures_iter(selector)
        .all(|caps| is_stable_class(&caps[1]))
}
