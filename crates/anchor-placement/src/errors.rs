//! Error types for marker placement

use thiserror::Error;

use crate::board::MarkerHandle;

#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("Unknown marker: {0}")]
    UnknownMarker(MarkerHandle),

    #[error("Invalid placement policy: {0}")]
    InvalidPolicy(String),
}
