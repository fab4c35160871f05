//! Placement registry: where every visible marker currently sits.

use std::collections::BTreeMap;

use live_dom::Rect;
use noteanchor_core_types::AnnotationId;
use serde::Serialize;

/// One visible marker, in viewport coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementRecord {
    pub annotation_id: AnnotationId,
    pub left: f64,
    pub top: f64,
    pub size: f64,
}

impl PlacementRecord {
    pub fn rect(&self) -> Rect {
        Rect::new(self.left, self.top, self.size, self.size)
    }
}

/// At most one record per annotation. Iteration order is by annotation id so
/// collision resolution is reproducible.
#[derive(Debug, Clone, Default)]
pub struct PlacementRegistry {
    records: BTreeMap<AnnotationId, PlacementRecord>,
}

impl PlacementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for its annotation.
    pub fn insert(&mut self, record: PlacementRecord) -> Option<PlacementRecord> {
        self.records.insert(record.annotation_id.clone(), record)
    }

    pub fn remove(&mut self, id: &AnnotationId) -> Option<PlacementRecord> {
        self.records.remove(id)
    }

    pub fn get(&self, id: &AnnotationId) -> Option<&PlacementRecord> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &AnnotationId) -> bool {
        self.records.contains_key(id)
    }

    pub fn records(&self) -> impl Iterator<Item = &PlacementRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
