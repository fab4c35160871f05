//! Anchor placement - note markers beside their anchored elements
//!
//! - Placement next to the element, clamped to the viewport
//! - Collision avoidance through a shared placement registry
//! - Visibility gating and a bounded wait for late geometry
//! - A marker board with a guarded bulk "place all" pass

pub mod board;
pub mod errors;
pub mod marker;
pub mod placement;
pub mod policy;
pub mod registry;

pub use board::{BatchEntry, BatchReport, MarkerBoard, MarkerHandle};
pub use errors::PlacementError;
pub use marker::{Marker, MarkerState};
pub use placement::{place, Placement};
pub use policy::PlacementPolicy;
pub use registry::{PlacementRecord, PlacementRegistry};
