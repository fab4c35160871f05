//! Structural signatures.
//!
//! A signature is a throwaway fingerprint taken just before a viewport change
//! (a recording that resizes the page, say) and used to find the same element
//! once the layout has reflowed. It is never persisted.

use std::collections::BTreeMap;
use std::time::Instant;

use live_dom::{escape_identifier, escape_string, truncate_chars, Document, NodeId};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::metrics;
use crate::policy::SignaturePolicy;

/// Attributes that tend to survive re-renders and responsive layout changes.
pub const STABLE_ATTRIBUTES: &[&str] = &[
    "data-testid",
    "data-test",
    "data-cy",
    "data-qa",
    "data-id",
    "name",
    "role",
    "aria-label",
    "aria-labelledby",
    "aria-describedby",
    "href",
    "src",
    "alt",
    "title",
    "for",
    "type",
    "placeholder",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub text_content: String,
    pub markup_snippet: String,
    #[serde(default)]
    pub stable_attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub classes: Vec<String>,
}

/// Which lookup produced a signature match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignatureTier {
    Identifier,
    StableAttributes,
    MarkupSimilarity,
    TextContent,
    ClassCombination,
}

impl SignatureTier {
    pub fn name(&self) -> &'static str {
        match self {
            SignatureTier::Identifier => "identifier",
            SignatureTier::StableAttributes => "stable-attributes",
            SignatureTier::MarkupSimilarity => "markup-similarity",
            SignatureTier::TextContent => "text-content",
            SignatureTier::ClassCombination => "class-combination",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignatureMatch {
    pub node: NodeId,
    pub tier: SignatureTier,
}

/// Position-by-position character agreement over the shared length, divided
/// by the longer length. Two empty strings score 0.
///
/// The formula is kept literally and is open for review: it aligns
/// characters by index only, so an insertion near the start of a snippet
/// (`"xab"` against `"ab"`) scores as a near-total mismatch even though the
/// content is shared. It is not an edit distance.
pub fn similarity(a: &str, b: &str) -> f64 {
    let longer = a.chars().count().max(b.chars().count());
    if longer == 0 {
        return 0.0;
    }
    let same = a.chars().zip(b.chars()).filter(|(x, y)| x == y).count();
    same as f64 / longer as f64
}

#[derive(Debug, Clone, Default)]
pub struct SignatureMatcher {
    policy: SignaturePolicy,
}

impl SignatureMatcher {
    pub fn new(policy: SignaturePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SignaturePolicy {
        &self.policy
    }

    /// Fingerprint an element. `None` for non-element nodes.
    pub fn create_signature(&self, doc: &Document, node: NodeId) -> Option<Signature> {
        let element = doc.element(node)?;
        let stable_attributes = STABLE_ATTRIBUTES
            .iter()
            .filter_map(|name| {
                doc.attribute(node, name)
                    .map(|value| (name.to_string(), value.to_string()))
            })
            .collect();
        Some(Signature {
            tag: element.tag().to_string(),
            id: doc.id_attr(node).map(str::to_string),
            text_content: doc.text_sample(node, self.policy.text_chars),
            markup_snippet: doc.markup_snippet(node, self.policy.markup_chars),
            stable_attributes,
            classes: doc.classes(node).into_iter().map(str::to_string).collect(),
        })
    }

    /// Find the element a signature was taken from. Never fails; `None` when
    /// no tier yields a unique hit.
    pub fn find_by_signature(&self, doc: &Document, signature: &Signature) -> Option<SignatureMatch> {
        let started = Instant::now();
        let found = self.run_cascade(doc, signature);
        metrics::record_signature(found.is_some(), started.elapsed());
        match &found {
            Some(hit) => debug!(tag = %signature.tag, tier = hit.tier.name(), node = %hit.node, "signature matched"),
            None => debug!(tag = %signature.tag, "signature not found"),
        }
        found
    }

    /// Whether `node` plausibly is the element `signature` describes.
    pub fn matches(&self, doc: &Document, node: NodeId, signature: &Signature) -> bool {
        if doc.tag(node) != Some(signature.tag.as_str()) {
            return false;
        }
        if let Some(id) = &signature.id {
            if doc.id_attr(node) != Some(id.as_str()) {
                return false;
            }
        }
        let prefix = truncate_chars(&signature.text_content, self.policy.text_prefix_chars);
        if !prefix.is_empty()
            && !doc
                .text_sample(node, self.policy.text_chars)
                .contains(prefix.trim_end())
        {
            return false;
        }
        signature
            .stable_attributes
            .iter()
            .all(|(name, value)| doc.attribute(node, name) == Some(value.as_str()))
    }

    fn run_cascade(&self, doc: &Document, signature: &Signature) -> Option<SignatureMatch> {
        let hit = |node, tier| Some(SignatureMatch { node, tier });

        if let Some(node) = self.by_identifier(doc, signature) {
            return hit(node, SignatureTier::Identifier);
        }
        if let Some(node) = self.by_stable_attributes(doc, signature) {
            return hit(node, SignatureTier::StableAttributes);
        }
        if let Some(node) = self.by_markup_similarity(doc, signature) {
            return hit(node, SignatureTier::MarkupSimilarity);
        }
        if let Some(node) = self.by_text(doc, signature) {
            return hit(node, SignatureTier::TextContent);
        }
        if let Some(node) = self.by_classes(doc, signature) {
            return hit(node, SignatureTier::ClassCombination);
        }
        None
    }

    fn by_identifier(&self, doc: &Document, signature: &Signature) -> Option<NodeId> {
        let id = signature.id.as_deref()?;
        let node = doc.element_by_id(id)?;
        (doc.tag(node) == Some(signature.tag.as_str())).then_some(node)
    }

    fn by_stable_attributes(&self, doc: &Document, signature: &Signature) -> Option<NodeId> {
        if signature.stable_attributes.is_empty() {
            return None;
        }
        let mut selector = signature.tag.clone();
        for (name, value) in &signature.stable_attributes {
            selector.push_str(&format!("[{name}={}]", escape_string(value)?));
        }
        let hits = doc.query_selector_all(&selector).ok()?;
        trace!(%selector, hits = hits.len(), "stable attribute lookup");
        self.single_or_matching(doc, hits, signature)
    }

    fn by_markup_similarity(&self, doc: &Document, signature: &Signature) -> Option<NodeId> {
        doc.elements_by_tag(&signature.tag).into_iter().find(|node| {
            let markup = doc.markup_snippet(*node, self.policy.markup_chars);
            similarity(&markup, &signature.markup_snippet) > self.policy.similarity_threshold
        })
    }

    fn by_text(&self, doc: &Document, signature: &Signature) -> Option<NodeId> {
        if signature.text_content.is_empty() {
            return None;
        }
        let hits: Vec<NodeId> = doc
            .elements_by_tag(&signature.tag)
            .into_iter()
            .filter(|node| doc.text_sample(*node, self.policy.text_chars) == signature.text_content)
            .collect();
        self.single_or_matching(doc, hits, signature)
    }

    fn by_classes(&self, doc: &Document, signature: &Signature) -> Option<NodeId> {
        if signature.classes.is_empty() {
            return None;
        }
        let mut selector = signature.tag.clone();
        for class in &signature.classes {
            selector.push('.');
            selector.push_str(&escape_identifier(class)?);
        }
        let hits = doc.query_selector_all(&selector).ok()?;
        (hits.len() == 1).then(|| hits[0])
    }

    fn single_or_matching(
        &self,
        doc: &Document,
        hits: Vec<NodeId>,
        signature: &Signature,
    ) -> Option<NodeId> {
        if hits.len() == 1 {
            return hits.first().copied();
        }
        let survivors: Vec<NodeId> = hits
            .into_iter()
            .filter(|node| self.matches(doc, *node, signature))
            .collect();
        (survivors.len() == 1).then(|| survivors[0])
    }
}
