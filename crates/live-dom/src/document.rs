//! Arena-backed document tree.
//!
//! Nodes live in a `Vec` and are addressed by [`NodeId`]. Ids are never reused
//! within one document, so a `NodeId` held by a cache stays unambiguous for the
//! lifetime of the [`Document`] that issued it. Removing a node only detaches
//! it; detached nodes are skipped by every query.

use std::fmt;

use noteanchor_core_types::{DocumentGeneration, Rect, Viewport};

use crate::errors::DomError;
use crate::text;

/// Index of a node inside a [`Document`] arena.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

#[derive(Clone, Debug)]
pub struct ElementData {
    tag: String,
    attributes: Vec<(String, String)>,
    rect: Rect,
}

impl ElementData {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }
}

#[derive(Clone, Debug)]
pub enum NodeKind {
    Element(ElementData),
    Text(String),
}

#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

/// A live document: the tree, its viewport and its generation.
#[derive(Clone, Debug)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    viewport: Viewport,
    generation: DocumentGeneration,
}

impl Document {
    /// Create a document with a single root element.
    pub fn new(root_tag: &str, viewport: Viewport) -> Self {
        let root = Node {
            kind: NodeKind::Element(ElementData {
                tag: root_tag.to_ascii_lowercase(),
                attributes: Vec::new(),
                rect: Rect::new(0.0, 0.0, viewport.width, viewport.height),
            }),
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            viewport,
            generation: DocumentGeneration::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn generation(&self) -> DocumentGeneration {
        self.generation
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Replace the viewport, e.g. to simulate a responsive breakpoint or a
    /// scroll. Layout is not recomputed; callers update rects themselves.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn scroll_to(&mut self, scroll_x: f64, scroll_y: f64) {
        self.viewport.scroll_x = scroll_x;
        self.viewport.scroll_y = scroll_y;
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, DomError> {
        self.nodes.get_mut(id.0).ok_or(DomError::UnknownNode(id))
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData, DomError> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Element(data) => Ok(data),
            NodeKind::Text(_) => Err(DomError::NotAnElement(id)),
        }
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.node(id)?.kind {
            NodeKind::Element(data) => Some(data),
            NodeKind::Text(_) => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    // ---- construction -------------------------------------------------

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            rect: Rect::default(),
        }))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.push(NodeKind::Text(content.to_string()))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Create an element and append it to `parent`.
    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> Result<NodeId, DomError> {
        let child = self.create_element(tag);
        self.append_child(parent, child)?;
        Ok(child)
    }

    /// Create a text node and append it to `parent`.
    pub fn append_text(&mut self, parent: NodeId, content: &str) -> Result<NodeId, DomError> {
        let child = self.create_text(content);
        self.append_child(parent, child)?;
        Ok(child)
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` under `parent` before `reference` (or at the end). The
    /// child is first detached from its current parent.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        if !self.is_element(parent) {
            return Err(match self.node(parent) {
                Some(_) => DomError::NotAnElement(parent),
                None => DomError::UnknownNode(parent),
            });
        }
        self.node_mut(child)?;
        if child == self.root {
            return Err(DomError::HierarchyRequest(
                "the root element cannot be re-parented".to_string(),
            ));
        }
        if child == parent || self.is_ancestor_of(child, parent) {
            return Err(DomError::HierarchyRequest(format!(
                "{child} is an ancestor of {parent}"
            )));
        }
        if let Some(reference) = reference {
            if self.node(reference).and_then(|n| n.parent) != Some(parent) {
                return Err(DomError::HierarchyRequest(format!(
                    "{reference} is not a child of {parent}"
                )));
            }
        }

        self.detach(child)?;
        let siblings = &mut self.node_mut(parent)?.children;
        let position = reference
            .and_then(|r| siblings.iter().position(|c| *c == r))
            .unwrap_or(siblings.len());
        siblings.insert(position, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Detach a node (and its subtree) from the tree.
    pub fn remove(&mut self, node: NodeId) -> Result<(), DomError> {
        if node == self.root {
            return Err(DomError::HierarchyRequest(
                "the root element cannot be removed".to_string(),
            ));
        }
        self.detach(node)
    }

    fn detach(&mut self, node: NodeId) -> Result<(), DomError> {
        let parent = self.node_mut(node)?.parent.take();
        if let Some(parent) = parent {
            self.node_mut(parent)?.children.retain(|c| *c != node);
        }
        Ok(())
    }

    /// Reorder the children of `parent`. `order` must be a permutation of the
    /// current children.
    pub fn reorder_children(&mut self, parent: NodeId, order: Vec<NodeId>) -> Result<(), DomError> {
        let node = self.node_mut(parent)?;
        let mut current = node.children.clone();
        let mut proposed = order.clone();
        current.sort();
        proposed.sort();
        if current != proposed {
            return Err(DomError::HierarchyRequest(format!(
                "new order is not a permutation of the children of {parent}"
            )));
        }
        node.children = order;
        Ok(())
    }

    pub fn reverse_children(&mut self, parent: NodeId) -> Result<(), DomError> {
        self.node_mut(parent)?.children.reverse();
        Ok(())
    }

    // ---- attributes and geometry --------------------------------------

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let name = name.to_ascii_lowercase();
        let element = self.element_mut(node)?;
        match element.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => element.attributes.push((name, value.to_string())),
        }
        Ok(())
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), DomError> {
        let name = name.to_ascii_lowercase();
        self.element_mut(node)?.attributes.retain(|(k, _)| *k != name);
        Ok(())
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?
            .attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn set_classes(&mut self, node: NodeId, classes: &[&str]) -> Result<(), DomError> {
        if classes.is_empty() {
            return self.remove_attribute(node, "class");
        }
        self.set_attribute(node, "class", &classes.join(" "))
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) -> Result<(), DomError> {
        let mut classes: Vec<String> = self.classes(node).iter().map(|c| c.to_string()).collect();
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
        self.set_attribute(node, "class", &classes.join(" "))
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|e| e.tag.as_str())
    }

    /// The element's `id` attribute when present and non-empty.
    pub fn id_attr(&self, node: NodeId) -> Option<&str> {
        self.attribute(node, "id").filter(|id| !id.is_empty())
    }

    pub fn classes(&self, node: NodeId) -> Vec<&str> {
        self.attribute(node, "class")
            .map(|value| value.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.classes(node).iter().any(|c| *c == class)
    }

    pub fn set_rect(&mut self, node: NodeId, rect: Rect) -> Result<(), DomError> {
        self.element_mut(node)?.rect = rect;
        Ok(())
    }

    /// Page-space bounding rectangle.
    pub fn rect(&self, node: NodeId) -> Option<Rect> {
        self.element(node).map(|e| e.rect)
    }

    /// Viewport-relative bounding rectangle.
    pub fn client_rect(&self, node: NodeId) -> Option<Rect> {
        self.rect(node).map(|r| self.viewport.to_client(&r))
    }

    // ---- traversal ----------------------------------------------------

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node)?.parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.node(node).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn element_children(&self, node: NodeId) -> Vec<NodeId> {
        self.children(node)
            .iter()
            .copied()
            .filter(|c| self.is_element(*c))
            .collect()
    }

    /// Ancestor elements, nearest first.
    pub fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(node);
        while let Some(id) = current {
            out.push(id);
            current = self.parent(id);
        }
        out
    }

    fn is_ancestor_of(&self, candidate: NodeId, node: NodeId) -> bool {
        self.ancestors(node).contains(&candidate)
    }

    /// True when the node is reachable from the root.
    pub fn is_connected(&self, node: NodeId) -> bool {
        if self.node(node).is_none() {
            return false;
        }
        if node == self.root {
            return true;
        }
        self.ancestors(node).last() == Some(&self.root)
    }

    /// All connected elements in document (pre-)order, root included.
    pub fn elements(&self) -> Vec<NodeId> {
        let mut out = vec![self.root];
        out.extend(self.descendants(self.root));
        out
    }

    /// Descendant elements of `node` in document order, excluding `node`.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if !self.is_element(id) {
                continue;
            }
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.elements()
            .into_iter()
            .filter(|id| self.tag(*id).is_some_and(|t| t.eq_ignore_ascii_case(tag)))
            .collect()
    }

    /// First connected element carrying `id`, like `getElementById`.
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        if id.is_empty() {
            return None;
        }
        self.elements()
            .into_iter()
            .find(|node| self.id_attr(*node) == Some(id))
    }

    /// Number of connected elements carrying `id`.
    pub fn count_id(&self, id: &str) -> usize {
        self.elements()
            .into_iter()
            .filter(|node| self.id_attr(*node) == Some(id))
            .count()
    }

    /// Concatenated text of all descendant text nodes, like `textContent`.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        let Some(entry) = self.node(node) else {
            return;
        };
        match &entry.kind {
            NodeKind::Text(content) => out.push_str(content),
            NodeKind::Element(_) => {
                for child in &entry.children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    /// Whitespace-normalized text truncated to `max_chars`.
    pub fn text_sample(&self, node: NodeId, max_chars: usize) -> String {
        text::text_sample(&self.text_content(node), max_chars)
    }

    /// 1-based position among element siblings sharing the same tag, and the
    /// number of such siblings.
    pub fn nth_of_type(&self, node: NodeId) -> Option<(usize, usize)> {
        let tag = self.tag(node)?;
        let Some(parent) = self.parent(node) else {
            return Some((1, 1));
        };
        let same: Vec<NodeId> = self
            .element_children(parent)
            .into_iter()
            .filter(|c| self.tag(*c) == Some(tag))
            .collect();
        let index = same.iter().position(|c| *c == node)? + 1;
        Some((index, same.len()))
    }
}
