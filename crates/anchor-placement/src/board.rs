//! Marker board: every marker of one host context plus their shared
//! placement registry.

use std::collections::BTreeMap;
use std::fmt;

use anchor_locator::{Descriptor, ElementLocator, LocatorStrategy};
use live_dom::{Document, DocumentGeneration, NodeId};
use noteanchor_core_types::AnnotationId;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::errors::PlacementError;
use crate::marker::{Marker, MarkerState};
use crate::policy::PlacementPolicy;
use crate::registry::PlacementRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MarkerHandle(u64);

impl fmt::Display for MarkerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "marker-{}", self.0)
    }
}

/// Per-descriptor outcome of a bulk pass.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchEntry {
    pub annotation_id: AnnotationId,
    pub display_index: usize,
    pub strategy: Option<LocatorStrategy>,
    pub marker: Option<MarkerState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upgraded_selector: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    /// The pass was refused because the call ceiling was exceeded.
    pub aborted: bool,
    pub placed: usize,
    pub hidden: usize,
    pub pending: usize,
    pub not_found: usize,
    pub entries: Vec<BatchEntry>,
}

#[derive(Debug)]
pub struct MarkerBoard {
    policy: PlacementPolicy,
    registry: PlacementRegistry,
    markers: BTreeMap<MarkerHandle, Marker>,
    next_handle: u64,
    calls_since_settle: u32,
    generation: Option<DocumentGeneration>,
}

impl Default for MarkerBoard {
    fn default() -> Self {
        Self::new(PlacementPolicy::default())
    }
}

impl MarkerBoard {
    pub fn new(policy: PlacementPolicy) -> Self {
        Self {
            policy,
            registry: PlacementRegistry::new(),
            markers: BTreeMap::new(),
            next_handle: 1,
            calls_since_settle: 0,
            generation: None,
        }
    }

    pub fn policy(&self) -> &PlacementPolicy {
        &self.policy
    }

    pub fn registry(&self) -> &PlacementRegistry {
        &self.registry
    }

    pub fn marker(&self, handle: MarkerHandle) -> Option<&Marker> {
        self.markers.get(&handle)
    }

    pub fn markers(&self) -> impl Iterator<Item = (MarkerHandle, &Marker)> {
        self.markers.iter().map(|(handle, marker)| (*handle, marker))
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn handle_for(&self, id: &AnnotationId) -> Option<MarkerHandle> {
        self.markers
            .iter()
            .find(|(_, marker)| marker.annotation_id() == id)
            .map(|(handle, _)| *handle)
    }

    /// Render hook: show a marker for `id` next to `element`. Re-attaching an
    /// annotation reuses its marker.
    pub fn attach(
        &mut self,
        doc: &Document,
        element: NodeId,
        id: &AnnotationId,
        display_index: usize,
    ) -> MarkerHandle {
        self.sync(doc);
        let handle = match self.handle_for(id) {
            Some(handle) => handle,
            None => {
                let handle = MarkerHandle(self.next_handle);
                self.next_handle += 1;
                self.markers
                    .insert(handle, Marker::new(id.clone(), display_index));
                handle
            }
        };
        if let Some(marker) = self.markers.get_mut(&handle) {
            marker.set_display_index(display_index);
            marker.locate(element);
            let state = marker.refresh(doc, &mut self.registry, &self.policy);
            debug!(%handle, %id, ?state, "marker attached");
        }
        handle
    }

    pub fn detach(&mut self, handle: MarkerHandle) -> Result<(), PlacementError> {
        let mut marker = self
            .markers
            .remove(&handle)
            .ok_or(PlacementError::UnknownMarker(handle))?;
        marker.remove(&mut self.registry);
        debug!(%handle, id = %marker.annotation_id(), "marker detached");
        Ok(())
    }

    /// Re-place every marker, e.g. after scroll or resize.
    pub fn refresh_all(&mut self, doc: &Document) {
        self.sync(doc);
        // Stale records from the previous pass must not push markers around.
        self.registry.clear();
        for marker in self.markers.values_mut() {
            marker.refresh(doc, &mut self.registry, &self.policy);
        }
    }

    /// One poll time unit for markers waiting on geometry.
    pub fn tick(&mut self, doc: &Document) {
        self.sync(doc);
        for marker in self.markers.values_mut().filter(|m| m.is_polling()) {
            marker.tick(doc, &mut self.registry, &self.policy);
        }
    }

    /// Host signal that the page is quiescent; re-arms `place_all`.
    pub fn settle(&mut self) {
        self.calls_since_settle = 0;
    }

    /// Element bindings never outlive the document generation they were made in.
    fn sync(&mut self, doc: &Document) {
        let current = doc.generation();
        if self.generation == Some(current) {
            return;
        }
        if self.generation.is_some() {
            debug!(generation = %current, markers = self.markers.len(), "document changed, unbinding markers");
            for marker in self.markers.values_mut() {
                marker.unbind(&mut self.registry);
            }
        }
        self.generation = Some(current);
    }

    /// Resolve every descriptor and place its marker. Markers whose element
    /// can no longer be found are detached. Upgraded selectors are written
    /// back into `descriptors`.
    pub fn place_all(
        &mut self,
        doc: &Document,
        locator: &mut ElementLocator,
        descriptors: &mut [Descriptor],
    ) -> BatchReport {
        self.calls_since_settle += 1;
        if self.calls_since_settle > self.policy.place_all_ceiling {
            error!(
                calls = self.calls_since_settle,
                ceiling = self.policy.place_all_ceiling,
                "place_all called too often without settling, aborting batch"
            );
            return BatchReport {
                aborted: true,
                ..BatchReport::default()
            };
        }

        self.sync(doc);
        self.registry.clear();
        let mut report = BatchReport::default();
        for (index, descriptor) in descriptors.iter_mut().enumerate() {
            let display_index = index + 1;
            let id = descriptor.id.clone();
            let Some(resolution) = locator.locate_and_upgrade(doc, descriptor) else {
                if let Some(handle) = self.handle_for(&id) {
                    if let Err(err) = self.detach(handle) {
                        warn!(%handle, %id, %err, "could not detach unresolved marker");
                    }
                }
                report.not_found += 1;
                report.entries.push(BatchEntry {
                    annotation_id: id,
                    display_index,
                    strategy: None,
                    marker: None,
                    upgraded_selector: None,
                });
                continue;
            };

            let handle = self.attach(doc, resolution.node, &id, display_index);
            let state = self.marker(handle).map(Marker::state);
            match state {
                Some(MarkerState::Placed { .. }) => report.placed += 1,
                Some(MarkerState::Hidden) => report.hidden += 1,
                _ => report.pending += 1,
            }
            report.entries.push(BatchEntry {
                annotation_id: id,
                display_index,
                strategy: Some(resolution.strategy),
                marker: state,
                upgraded_selector: resolution.upgraded_selector,
            });
        }

        // Markers outside this batch lost their records with the clear above.
        for marker in self.markers.values_mut() {
            if !descriptors.iter().any(|d| &d.id == marker.annotation_id()) {
                marker.refresh(doc, &mut self.registry, &self.policy);
            }
        }

        info!(
            total = descriptors.len(),
            placed = report.placed,
            hidden = report.hidden,
            pending = report.pending,
            not_found = report.not_found,
            "place_all finished"
        );
        report
    }
}
