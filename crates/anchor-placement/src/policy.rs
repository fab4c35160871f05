//! Placement tunables.

use serde::{Deserialize, Serialize};

use crate::errors::PlacementError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementPolicy {
    /// Marker edge length; markers are square.
    pub marker_size: f64,
    /// Space between the element's right edge and the marker.
    pub gap: f64,
    /// Minimum distance kept from the viewport's right edge.
    pub viewport_margin: f64,
    pub collision_padding: f64,
    pub vertical_spacing: f64,
    pub max_collision_iterations: usize,
    /// Ticks a marker waits for usable geometry before giving up.
    pub poll_window_ticks: u32,
    /// `place_all` calls allowed between two `settle()` calls.
    pub place_all_ceiling: u32,
}

impl Default for PlacementPolicy {
    fn default() -> Self {
        Self {
            marker_size: 24.0,
            gap: 8.0,
            viewport_margin: 8.0,
            collision_padding: 4.0,
            vertical_spacing: 4.0,
            max_collision_iterations: 50,
            poll_window_ticks: 10,
            place_all_ceiling: 8,
        }
    }
}

impl PlacementPolicy {
    /// Distance from the viewport's right edge to a clamped marker's left edge.
    pub fn right_offset(&self) -> f64 {
        self.marker_size + self.viewport_margin
    }

    pub fn validate(&self) -> Result<(), PlacementError> {
        if !(self.marker_size > 0.0) {
            return Err(PlacementError::InvalidPolicy(
                "marker_size must be positive".to_string(),
            ));
        }
        if self.gap < 0.0 || self.viewport_margin < 0.0 {
            return Err(PlacementError::InvalidPolicy(
                "gap and viewport_margin must not be negative".to_string(),
            ));
        }
        if self.place_all_ceiling == 0 {
            return Err(PlacementError::InvalidPolicy(
                "place_all_ceiling must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
