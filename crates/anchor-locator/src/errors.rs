//! Error types for the locator
//!
//! "Not found" is never an error here: locating and signature matching return
//! `Option`. These variants cover malformed input only.

use live_dom::DomError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocatorError {
    /// Descriptor is missing required fields
    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    /// Target node is not an element of the document
    #[error("Not an element: {0}")]
    NotAnElement(String),

    /// Descriptor JSON could not be decoded
    #[error("Descriptor decode failed: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Document error: {0}")]
    Dom(#[from] DomError),
}

impl LocatorError {
    /// Whether the caller supplied bad input, as opposed to a document fault.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            LocatorError::InvalidDescriptor(_) | LocatorError::Decode(_)
        )
    }
}
