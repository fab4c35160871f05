//! Marker placement.
//!
//! Markers sit just right of their element, aligned with its top edge, and
//! are nudged to stay inside the viewport, off the element itself and clear
//! of every other marker. All coordinates are viewport-relative.

use live_dom::{Rect, Viewport};
use noteanchor_core_types::AnnotationId;
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::policy::PlacementPolicy;
use crate::registry::{PlacementRecord, PlacementRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum Placement {
    Placed { left: f64, top: f64 },
    /// Element is outside the viewport.
    Hidden,
    /// Element has no usable geometry yet.
    Deferred,
}

/// Place the marker for `id` next to `element` (client rect).
///
/// Hidden and deferred outcomes leave no record behind. A marker pushed past
/// the bottom of the viewport by its neighbours is hidden too.
pub fn place(
    element: Rect,
    viewport: &Viewport,
    id: &AnnotationId,
    registry: &mut PlacementRegistry,
    policy: &PlacementPolicy,
) -> Placement {
    // The marker never collides with its own previous position.
    registry.remove(id);

    if element.is_empty() {
        trace!(%id, "zero-size element, deferring marker");
        return Placement::Deferred;
    }
    if !element.intersects(&viewport.bounds()) {
        trace!(%id, "element off screen, hiding marker");
        return Placement::Hidden;
    }

    let size = policy.marker_size;
    let mut left = element.right() + policy.gap;
    let mut top = element.top();

    if left + size > viewport.width - policy.viewport_margin {
        left = viewport.width - policy.right_offset();
    }

    let marker = Rect::new(left, top, size, size);
    if marker.intersects(&element) {
        let below = element.bottom() + policy.gap;
        let above = element.top() - policy.gap - size;
        if below + size <= viewport.height {
            top = below;
        } else if above >= 0.0 {
            top = above;
        } else {
            top = top.clamp(0.0, (viewport.height - size).max(0.0));
            debug!(%id, "no room above or below element, accepting overlap");
        }
    }

    let pushed = avoid_collisions(left, top, registry, policy, id);
    if pushed > top && pushed + size > viewport.height {
        debug!(%id, top = pushed, "collision push left the viewport, hiding marker");
        return Placement::Hidden;
    }
    top = pushed;

    registry.insert(PlacementRecord {
        annotation_id: id.clone(),
        left,
        top,
        size,
    });
    Placement::Placed { left, top }
}

fn collides(left: f64, top: f64, other: &PlacementRecord, policy: &PlacementPolicy) -> bool {
    let size = policy.marker_size;
    (other.left - left).abs() < size + policy.collision_padding
        && (other.top - top).abs() < size + policy.vertical_spacing
}

fn avoid_collisions(
    left: f64,
    mut top: f64,
    registry: &PlacementRegistry,
    policy: &PlacementPolicy,
    id: &AnnotationId,
) -> f64 {
    for _ in 0..policy.max_collision_iterations {
        let Some(other) = registry
            .records()
            .find(|other| collides(left, top, other, policy))
        else {
            return top;
        };
        top = other.top + other.size + policy.vertical_spacing;
    }
    warn!(%id, iterations = policy.max_collision_iterations, "collision avoidance gave up");
    top
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Viewport, PlacementRegistry, PlacementPolicy) {
        (
            Viewport::new(1000.0, 800.0),
            PlacementRegistry::new(),
            PlacementPolicy::default(),
        )
    }

    #[test]
    fn test_default_position_right_of_element() {
        let (viewport, mut registry, policy) = setup();
        let id = AnnotationId::from("a");
        let placement = place(
            Rect::new(100.0, 50.0, 200.0, 40.0),
            &viewport,
            &id,
            &mut registry,
            &policy,
        );
        assert_eq!(placement, Placement::Placed { left: 308.0, top: 50.0 });
        assert!(registry.contains(&id));
    }

    #[test]
    fn test_clamped_to_right_edge() {
        let (viewport, mut registry, policy) = setup();
        let placement = place(
            Rect::new(600.0, 50.0, 390.0, 40.0),
            &viewport,
            &AnnotationId::from("a"),
            &mut registry,
            &policy,
        );
        // Clamped marker overlaps the element, so it moves below it.
        assert_eq!(placement, Placement::Placed { left: 968.0, top: 98.0 });
    }

    #[test]
    fn test_moves_above_when_no_room_below() {
        let (viewport, mut registry, policy) = setup();
        let placement = place(
            Rect::new(0.0, 700.0, 1000.0, 90.0),
            &viewport,
            &AnnotationId::from("a"),
            &mut registry,
            &policy,
        );
        assert_eq!(placement, Placement::Placed { left: 968.0, top: 668.0 });
    }

    #[test]
    fn test_full_height_element_accepts_overlap() {
        let (viewport, mut registry, policy) = setup();
        let placement = place(
            Rect::new(0.0, 0.0, 1000.0, 800.0),
            &viewport,
            &AnnotationId::from("a"),
            &mut registry,
            &policy,
        );
        assert_eq!(placement, Placement::Placed { left: 968.0, top: 0.0 });
    }

    #[test]
    fn test_off_screen_is_hidden_and_unregistered() {
        let (viewport, mut registry, policy) = setup();
        let id = AnnotationId::from("a");
        place(Rect::new(10.0, 10.0, 50.0, 20.0), &viewport, &id, &mut registry, &policy);
        assert!(registry.contains(&id));

        let placement = place(
            Rect::new(10.0, 900.0, 50.0, 20.0),
            &viewport,
            &id,
            &mut registry,
            &policy,
        );
        assert_eq!(placement, Placement::Hidden);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_zero_size_is_deferred() {
        let (viewport, mut registry, policy) = setup();
        let placement = place(
            Rect::new(10.0, 10.0, 0.0, 0.0),
            &viewport,
            &AnnotationId::from("a"),
            &mut registry,
            &policy,
        );
        assert_eq!(placement, Placement::Deferred);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_sequential_markers_do_not_collide() {
        let (viewport, mut registry, policy) = setup();
        for (i, y) in [100.0, 105.0, 110.0, 112.0, 140.0].iter().enumerate() {
            let id = AnnotationId::from(format!("n{i}"));
            place(Rect::new(50.0, *y, 300.0, 10.0), &viewport, &id, &mut registry, &policy);
        }
        let records: Vec<&PlacementRecord> = registry.records().collect();
        assert_eq!(records.len(), 5);
        for a in &records {
            for b in &records {
                if a.annotation_id != b.annotation_id {
                    assert!(!collides(a.left, a.top, b, &policy), "{a:?} collides with {b:?}");
                }
            }
        }
    }

    #[test]
    fn test_marker_pushed_below_viewport_is_hidden() {
        let (viewport, mut registry, policy) = setup();
        let rows = [740.0, 745.0, 750.0];
        let placements: Vec<Placement> = rows
            .iter()
            .enumerate()
            .map(|(i, y)| {
                let id = AnnotationId::from(format!("n{i}"));
                place(Rect::new(50.0, *y, 300.0, 10.0), &viewport, &id, &mut registry, &policy)
            })
            .collect();

        assert_eq!(placements[0], Placement::Placed { left: 358.0, top: 740.0 });
        assert_eq!(placements[1], Placement::Placed { left: 358.0, top: 768.0 });
        assert_eq!(placements[2], Placement::Hidden);
        assert_eq!(registry.len(), 2);
        assert!(!registry.contains(&AnnotationId::from("n2")));
        for record in registry.records() {
            assert!(record.top + record.size <= viewport.height);
        }
    }

    #[test]
    fn test_replacing_own_record_does_not_self_collide() {
        let (viewport, mut registry, policy) = setup();
        let id = AnnotationId::from("a");
        let rect = Rect::new(100.0, 50.0, 200.0, 40.0);
        let first = place(rect, &viewport, &id, &mut registry, &policy);
        let second = place(rect, &viewport, &id, &mut registry, &policy);
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
    }
}
