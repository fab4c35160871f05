//! CSS selector queries against the live document.
//!
//! Parsing and matching are delegated to the `selectors` crate; this module
//! only adapts the arena to its `Element` trait.

use std::fmt;

use cssparser::{Parser, ParserInput};
use selectors::attr::{AttrSelectorOperation, AttrSelectorOperator, CaseSensitivity, NamespaceConstraint};
use selectors::matching::{
    matches_selector, IgnoreNthChildForInvalidation, MatchingContext, MatchingMode,
    NeedsSelectorFlags, QuirksMode,
};
use selectors::parser::{SelectorList, SelectorParseErrorKind};
use selectors::{NthIndexCache, OpaqueElement};
use tracing::trace;

use crate::document::{Document, NodeId};
use crate::errors::DomError;

/// A parsed selector list, reusable across queries.
pub struct CompiledSelector {
    source: String,
    list: SelectorList<SelectorImpl>,
}

impl CompiledSelector {
    pub fn parse(selector: &str) -> Result<Self, DomError> {
        let mut input = ParserInput::new(selector);
        let mut parser = Parser::new(&mut input);
        let list = SelectorList::<SelectorImpl>::parse(
            &SelectorParser,
            &mut parser,
            selectors::parser::ParseRelative::No,
        )
        .map_err(|_| DomError::invalid_selector(selector))?;
        Ok(Self {
            source: selector.to_string(),
            list,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for CompiledSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSelector")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl Document {
    /// All connected elements matching `selector`, in document order.
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, DomError> {
        let compiled = CompiledSelector::parse(selector)?;
        Ok(self.select(&compiled))
    }

    /// First connected element matching `selector`.
    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>, DomError> {
        Ok(self.query_selector_all(selector)?.into_iter().next())
    }

    /// Number of matches; an unparsable selector matches nothing.
    pub fn count_matches(&self, selector: &str) -> usize {
        match self.query_selector_all(selector) {
            Ok(hits) => hits.len(),
            Err(err) => {
                trace!(%selector, %err, "selector rejected while counting matches");
                0
            }
        }
    }

    pub fn select(&self, selector: &CompiledSelector) -> Vec<NodeId> {
        let mut nth_index_cache = NthIndexCache::default();
        let mut context = MatchingContext::new(
            MatchingMode::Normal,
            None,
            &mut nth_index_cache,
            QuirksMode::NoQuirks,
            NeedsSelectorFlags::No,
            IgnoreNthChildForInvalidation::No,
        );
        self.elements()
            .into_iter()
            .filter(|node| {
                let element = ElementRef::new(*node, self);
                selector
                    .list
                    .0
                    .iter()
                    .any(|s| matches_selector(s, 0, None, &element, &mut context))
            })
            .collect()
    }

    /// Whether `node` matches `selector`.
    pub fn matches(&self, node: NodeId, selector: &str) -> Result<bool, DomError> {
        if !self.is_element(node) {
            return Ok(false);
        }
        let compiled = CompiledSelector::parse(selector)?;
        let mut nth_index_cache = NthIndexCache::default();
        let mut context = MatchingContext::new(
            MatchingMode::Normal,
            None,
            &mut nth_index_cache,
            QuirksMode::NoQuirks,
            NeedsSelectorFlags::No,
            IgnoreNthChildForInvalidation::No,
        );
        let element = ElementRef::new(node, self);
        Ok(compiled
            .list
            .0
            .iter()
            .any(|s| matches_selector(s, 0, None, &element, &mut context)))
    }
}

/// Borrowed view of one element implementing `selectors::Element`.
#[derive(Clone)]
pub(crate) struct ElementRef<'a> {
    node: NodeId,
    doc: &'a Document,
}

impl<'a> fmt::Debug for ElementRef<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementRef")
            .field("node", &self.node)
            .finish_non_exhaustive()
    }
}

impl<'a> ElementRef<'a> {
    fn new(node: NodeId, doc: &'a Document) -> Self {
        Self { node, doc }
    }

    fn tag(&self) -> Option<&'a str> {
        self.doc.tag(self.node)
    }

    fn attribute(&self, name: &str) -> Option<&'a str> {
        self.doc.attribute(self.node, name)
    }

    fn wrap(&self, node: NodeId) -> Self {
        Self::new(node, self.doc)
    }

    fn sibling_elements(&self) -> Vec<NodeId> {
        match self.doc.parent(self.node) {
            Some(parent) => self.doc.element_children(parent),
            None => Vec::new(),
        }
    }
}

impl<'a> selectors::Element for ElementRef<'a> {
    type Impl = SelectorImpl;

    fn opaque(&self) -> OpaqueElement {
        match self.doc.node(self.node) {
            Some(node) => OpaqueElement::new(node),
            None => OpaqueElement::new(self.doc),
        }
    }

    fn parent_element(&self) -> Option<Self> {
        let parent = self.doc.parent(self.node)?;
        self.doc.is_element(parent).then(|| self.wrap(parent))
    }

    fn parent_node_is_shadow_root(&self) -> bool {
        false
    }

    fn containing_shadow_host(&self) -> Option<Self> {
        None
    }

    fn is_pseudo_element(&self) -> bool {
        false
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        let siblings = self.sibling_elements();
        let index = siblings.iter().position(|s| *s == self.node)?;
        index.checked_sub(1).map(|i| self.wrap(siblings[i]))
    }

    fn next_sibling_element(&self) -> Option<Self> {
        let siblings = self.sibling_elements();
        let index = siblings.iter().position(|s| *s == self.node)?;
        siblings.get(index + 1).map(|s| self.wrap(*s))
    }

    fn first_element_child(&self) -> Option<Self> {
        self.doc
            .element_children(self.node)
            .first()
            .map(|c| self.wrap(*c))
    }

    fn is_html_element_in_html_document(&self) -> bool {
        true
    }

    fn has_local_name(&self, local_name: &str) -> bool {
        self.tag().map_or(false, |name| name == local_name)
    }

    fn has_namespace(&self, _ns: &()) -> bool {
        true
    }

    fn is_same_type(&self, other: &Self) -> bool {
        self.tag() == other.tag()
    }

    fn attr_matches(
        &self,
        ns: &NamespaceConstraint<&()>,
        local_name: &AttrString,
        operation: &AttrSelectorOperation<&AttrString>,
    ) -> bool {
        if !matches!(ns, NamespaceConstraint::Specific(())) {
            return false;
        }
        let Some(actual) = self.attribute(&local_name.0) else {
            return false;
        };

        match operation {
            AttrSelectorOperation::Exists => true,
            AttrSelectorOperation::WithValue {
                operator,
                case_sensitivity,
                value,
            } => {
                let insensitive = *case_sensitivity != CaseSensitivity::CaseSensitive;
                let (actual, expected) = if insensitive {
                    (actual.to_ascii_lowercase(), value.0.to_ascii_lowercase())
                } else {
                    (actual.to_string(), value.0.clone())
                };
                match operator {
                    AttrSelectorOperator::Equal => actual == expected,
                    AttrSelectorOperator::Includes => {
                        actual.split_whitespace().any(|part| part == expected)
                    }
                    AttrSelectorOperator::DashMatch => {
                        actual == expected || actual.starts_with(&format!("{expected}-"))
                    }
                    AttrSelectorOperator::Prefix => {
                        !expected.is_empty() && actual.starts_with(&expected)
                    }
                    AttrSelectorOperator::Suffix => {
                        !expected.is_empty() && actual.ends_with(&expected)
                    }
                    AttrSelectorOperator::Substring => {
                        !expected.is_empty() && actual.contains(&expected)
                    }
                }
            }
        }
    }

    fn match_non_ts_pseudo_class(
        &self,
        _pc: &NonTSPseudoClass,
        _context: &mut MatchingContext<Self::Impl>,
    ) -> bool {
        false
    }

    fn match_pseudo_element(
        &self,
        _pe: &PseudoElement,
        _context: &mut MatchingContext<Self::Impl>,
    ) -> bool {
        false
    }

    fn apply_selector_flags(&self, _flags: selectors::matching::ElementSelectorFlags) {}

    fn is_link(&self) -> bool {
        self.tag().map_or(false, |name| name == "a" || name == "area")
            && self.attribute("href").is_some()
    }

    fn is_html_slot_element(&self) -> bool {
        self.tag().map_or(false, |name| name == "slot")
    }

    fn has_id(&self, id: &AttrString, case_sensitivity: CaseSensitivity) -> bool {
        self.attribute("id")
            .map_or(false, |actual| match case_sensitivity {
                CaseSensitivity::CaseSensitive => actual == id.0,
                CaseSensitivity::AsciiCaseInsensitive => actual.eq_ignore_ascii_case(&id.0),
            })
    }

    fn has_class(&self, name: &AttrString, case_sensitivity: CaseSensitivity) -> bool {
        self.attribute("class").map_or(false, |classes| {
            classes
                .split_whitespace()
                .any(|class| match case_sensitivity {
                    CaseSensitivity::CaseSensitive => class == name.0,
                    CaseSensitivity::AsciiCaseInsensitive => class.eq_ignore_ascii_case(&name.0),
                })
        })
    }

    fn imported_part(&self, _name: &AttrString) -> Option<AttrString> {
        None
    }

    fn is_part(&self, _name: &AttrString) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        self.doc.children(self.node).iter().all(|child| {
            !self.doc.is_element(*child) && self.doc.text_content(*child).trim().is_empty()
        })
    }

    fn is_root(&self) -> bool {
        self.node == self.doc.root()
    }
}

/// String wrapper satisfying the `selectors` value bounds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct AttrString(pub String);

impl From<&str> for AttrString {
    fn from(s: &str) -> Self {
        AttrString(s.to_string())
    }
}

impl std::borrow::Borrow<str> for AttrString {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl cssparser::ToCss for AttrString {
    fn to_css<W>(&self, dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        cssparser::serialize_string(&self.0, dest)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SelectorImpl;

impl selectors::SelectorImpl for SelectorImpl {
    type ExtraMatchingData<'a> = ();
    type AttrValue = AttrString;
    type Identifier = AttrString;
    type LocalName = AttrString;
    type NamespacePrefix = AttrString;
    type NamespaceUrl = ();
    type BorrowedLocalName = str;
    type BorrowedNamespaceUrl = ();
    type NonTSPseudoClass = NonTSPseudoClass;
    type PseudoElement = PseudoElement;
}

/// No state pseudo-classes (`:hover`, `:focus`, ...) are supported; a live
/// snapshot has no interaction state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NonTSPseudoClass {}

impl selectors::parser::NonTSPseudoClass for NonTSPseudoClass {
    type Impl = SelectorImpl;

    fn is_active_or_hover(&self) -> bool {
        match *self {}
    }

    fn is_user_action_state(&self) -> bool {
        match *self {}
    }
}

impl cssparser::ToCss for NonTSPseudoClass {
    fn to_css<W>(&self, _dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        match *self {}
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PseudoElement {}

impl selectors::parser::PseudoElement for PseudoElement {
    type Impl = SelectorImpl;
}

impl cssparser::ToCss for PseudoElement {
    fn to_css<W>(&self, _dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        match *self {}
    }
}

struct SelectorParser;

impl<'i> selectors::parser::Parser<'i> for SelectorParser {
    type Impl = SelectorImpl;
    type Error = SelectorParseErrorKind<'i>;

    fn parse_non_ts_pseudo_class(
        &self,
        location: cssparser::SourceLocation,
        name: cssparser::CowRcStr<'i>,
    ) -> Result<NonTSPseudoClass, cssparser::ParseError<'i, SelectorParseErrorKind<'i>>> {
        Err(location.new_custom_error(SelectorParseErrorKind::UnsupportedPseudoClassOrElement(name)))
    }

    fn parse_pseudo_element(
        &self,
        location: cssparser::SourceLocation,
        name: cssparser::CowRcStr<'i>,
    ) -> Result<PseudoElement, cssparser::ParseError<'i, SelectorParseErrorKind<'i>>> {
        Err(location.new_custom_error(SelectorParseErrorKind::UnsupportedPseudoClassOrElement(name)))
    }

    fn parse_non_ts_functional_pseudo_class<'t>(
        &self,
        name: cssparser::CowRcStr<'i>,
        parser: &mut Parser<'i, 't>,
    ) -> Result<NonTSPseudoClass, cssparser::ParseError<'i, SelectorParseErrorKind<'i>>> {
        Err(parser.new_custom_error(SelectorParseErrorKind::UnsupportedPseudoClassOrElement(name)))
    }

    fn default_namespace(&self) -> Option<()> {
        None
    }

    fn namespace_for_prefix(&self, _prefix: &AttrString) -> Option<()> {
        None
    }
}
