//! Identity marks: the O(1) fast path from annotation id to a node resolved
//! earlier in the same document generation.

use std::collections::HashMap;

use live_dom::{Document, DocumentGeneration, NodeId};
use noteanchor_core_types::AnnotationId;
use tracing::debug;

#[derive(Debug, Default)]
pub struct IdentityMarks {
    generation: Option<DocumentGeneration>,
    marks: HashMap<AnnotationId, NodeId>,
}

impl IdentityMarks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&mut self, doc: &Document, id: &AnnotationId) -> Option<NodeId> {
        self.sync(doc);
        let node = *self.marks.get(id)?;
        if doc.is_connected(node) && doc.is_element(node) {
            return Some(node);
        }
        debug!(%id, %node, "dropping mark for detached node");
        self.marks.remove(id);
        None
    }

    pub fn mark(&mut self, doc: &Document, id: &AnnotationId, node: NodeId) {
        self.sync(doc);
        self.marks.insert(id.clone(), node);
    }

    pub fn forget(&mut self, id: &AnnotationId) -> Option<NodeId> {
        self.marks.remove(id)
    }

    pub fn clear(&mut self) {
        self.marks.clear();
        self.generation = None;
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Marks never outlive the document generation they were taken in.
    fn sync(&mut self, doc: &Document) {
        let current = doc.generation();
        if self.generation == Some(current) {
            return;
        }
        if !self.marks.is_empty() {
            debug!(
                dropped = self.marks.len(),
                generation = %current,
                "document changed, clearing identity marks"
            );
        }
        self.marks.clear();
        self.generation = Some(current);
    }
}
