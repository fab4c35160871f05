//! Per-marker lifecycle.
//!
//! ```text
//! Unplaced -> Located -> Placed <-> Hidden -> Removed
//! ```
//!
//! A located marker whose element has no geometry yet polls on every tick
//! for a bounded window, then falls back to `Unplaced` without complaint.

use live_dom::{Document, NodeId};
use noteanchor_core_types::AnnotationId;
use serde::Serialize;
use tracing::debug;

use crate::placement::{place, Placement};
use crate::policy::PlacementPolicy;
use crate::registry::PlacementRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum MarkerState {
    Unplaced,
    Located,
    Placed { left: f64, top: f64 },
    Hidden,
    Removed,
}

#[derive(Debug, Clone)]
pub struct Marker {
    annotation_id: AnnotationId,
    display_index: usize,
    element: Option<NodeId>,
    state: MarkerState,
    /// Ticks spent waiting for geometry; `None` when not polling.
    polled: Option<u32>,
}

impl Marker {
    pub fn new(annotation_id: AnnotationId, display_index: usize) -> Self {
        Self {
            annotation_id,
            display_index,
            element: None,
            state: MarkerState::Unplaced,
            polled: None,
        }
    }

    pub fn annotation_id(&self) -> &AnnotationId {
        &self.annotation_id
    }

    pub fn display_index(&self) -> usize {
        self.display_index
    }

    pub fn set_display_index(&mut self, display_index: usize) {
        self.display_index = display_index;
    }

    pub fn element(&self) -> Option<NodeId> {
        self.element
    }

    pub fn state(&self) -> MarkerState {
        self.state
    }

    pub fn is_polling(&self) -> bool {
        self.polled.is_some()
    }

    /// Bind the marker to a resolved element.
    pub fn locate(&mut self, element: NodeId) {
        if self.state == MarkerState::Removed {
            return;
        }
        if self.element != Some(element) {
            self.polled = None;
        }
        self.element = Some(element);
        if self.state == MarkerState::Unplaced {
            self.state = MarkerState::Located;
        }
    }

    /// Run a placement pass from scratch.
    pub fn refresh(
        &mut self,
        doc: &Document,
        registry: &mut PlacementRegistry,
        policy: &PlacementPolicy,
    ) -> MarkerState {
        if self.state == MarkerState::Removed {
            return self.state;
        }
        let Some(element) = self.element else {
            return self.state;
        };
        let rect = match doc.client_rect(element) {
            Some(rect) if doc.is_connected(element) => rect,
            _ => {
                debug!(id = %self.annotation_id, "element gone, marker unplaced");
                registry.remove(&self.annotation_id);
                self.element = None;
                self.polled = None;
                self.state = MarkerState::Unplaced;
                return self.state;
            }
        };

        self.state = match place(rect, &doc.viewport(), &self.annotation_id, registry, policy) {
            Placement::Placed { left, top } => {
                self.polled = None;
                MarkerState::Placed { left, top }
            }
            Placement::Hidden => {
                self.polled = None;
                MarkerState::Hidden
            }
            Placement::Deferred => {
                self.polled.get_or_insert(0);
                MarkerState::Located
            }
        };
        self.state
    }

    /// Advance the geometry poll by one time unit.
    pub fn tick(
        &mut self,
        doc: &Document,
        registry: &mut PlacementRegistry,
        policy: &PlacementPolicy,
    ) -> MarkerState {
        let Some(polled) = self.polled else {
            return self.state;
        };
        let polled = polled + 1;
        self.polled = Some(polled);
        let state = self.refresh(doc, registry, policy);
        if state == MarkerState::Located && polled >= policy.poll_window_ticks {
            debug!(id = %self.annotation_id, ticks = polled, "geometry never settled, giving up");
            self.polled = None;
            self.state = MarkerState::Unplaced;
        }
        self.state
    }

    /// Forget the element, e.g. after a reload. The marker waits to be
    /// located again.
    pub fn unbind(&mut self, registry: &mut PlacementRegistry) {
        if self.state == MarkerState::Removed {
            return;
        }
        registry.remove(&self.annotation_id);
        self.element = None;
        self.polled = None;
        self.state = MarkerState::Unplaced;
    }

    pub fn remove(&mut self, registry: &mut PlacementRegistry) {
        registry.remove(&self.annotation_id);
        self.polled = None;
        self.state = MarkerState::Removed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use live_dom::{Rect, Viewport};

    fn page() -> (Document, NodeId) {
        let mut doc = Document::new("html", Viewport::new(800.0, 600.0));
        let body = doc.append_element(doc.root(), "body").unwrap();
        let p = doc.append_element(body, "p").unwrap();
        doc.set_rect(p, Rect::new(20.0, 40.0, 300.0, 20.0)).unwrap();
        (doc, p)
    }

    #[test]
    fn test_located_then_placed() {
        let (doc, p) = page();
        let mut registry = PlacementRegistry::new();
        let policy = PlacementPolicy::default();
        let mut marker = Marker::new(AnnotationId::from("a"), 1);
        assert_eq!(marker.state(), MarkerState::Unplaced);

        marker.locate(p);
        assert_eq!(marker.state(), MarkerState::Located);
        let state = marker.refresh(&doc, &mut registry, &policy);
        assert_eq!(state, MarkerState::Placed { left: 328.0, top: 40.0 });
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_hidden_and_back() {
        let (mut doc, p) = page();
        let mut registry = PlacementRegistry::new();
        let policy = PlacementPolicy::default();
        let mut marker = Marker::new(AnnotationId::from("a"), 1);
        marker.locate(p);
        marker.refresh(&doc, &mut registry, &policy);

        doc.scroll_to(0.0, 1000.0);
        assert_eq!(marker.refresh(&doc, &mut registry, &policy), MarkerState::Hidden);
        assert!(registry.is_empty());

        doc.scroll_to(0.0, 0.0);
        assert!(matches!(
            marker.refresh(&doc, &mut registry, &policy),
            MarkerState::Placed { .. }
        ));
    }

    #[test]
    fn test_zero_size_polls_then_gives_up() {
        let (mut doc, p) = page();
        doc.set_rect(p, Rect::new(20.0, 40.0, 0.0, 0.0)).unwrap();
        let mut registry = PlacementRegistry::new();
        let policy = PlacementPolicy::default();
        let mut marker = Marker::new(AnnotationId::from("a"), 1);
        marker.locate(p);

        assert_eq!(marker.refresh(&doc, &mut registry, &policy), MarkerState::Located);
        assert!(marker.is_polling());
        for _ in 0..policy.poll_window_ticks - 1 {
            assert_eq!(marker.tick(&doc, &mut registry, &policy), MarkerState::Located);
        }
        assert_eq!(marker.tick(&doc, &mut registry, &policy), MarkerState::Unplaced);
        assert!(!marker.is_polling());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_geometry_arriving_within_window() {
        let (mut doc, p) = page();
        doc.set_rect(p, Rect::new(20.0, 40.0, 0.0, 0.0)).unwrap();
        let mut registry = PlacementRegistry::new();
        let policy = PlacementPolicy::default();
        let mut marker = Marker::new(AnnotationId::from("a"), 1);
        marker.locate(p);
        marker.refresh(&doc, &mut registry, &policy);
        marker.tick(&doc, &mut registry, &policy);

        doc.set_rect(p, Rect::new(20.0, 40.0, 300.0, 20.0)).unwrap();
        assert!(matches!(
            marker.tick(&doc, &mut registry, &policy),
            MarkerState::Placed { .. }
        ));
        assert!(!marker.is_polling());
    }

    #[test]
    fn test_removed_is_terminal() {
        let (doc, p) = page();
        let mut registry = PlacementRegistry::new();
        let policy = PlacementPolicy::default();
        let mut marker = Marker::new(AnnotationId::from("a"), 1);
        marker.locate(p);
        marker.refresh(&doc, &mut registry, &policy);
        marker.remove(&mut registry);

        assert!(registry.is_empty());
        assert_eq!(marker.refresh(&doc, &mut registry, &policy), MarkerState::Removed);
        marker.locate(p);
        assert_eq!(marker.state(), MarkerState::Removed);
    }
}
