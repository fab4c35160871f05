//! Live document model
//!
//! An arena-backed element tree standing in for the rendered page:
//! - nodes addressed by stable [`NodeId`]s, with page-space rectangles
//! - CSS selector queries through the `selectors` crate
//! - `textContent`-style text extraction and normalization
//! - outer-markup serialization
//! - JSON snapshot loading

pub mod document;
pub mod errors;
pub mod escape;
pub mod markup;
pub mod query;
pub mod snapshot;
pub mod text;

pub use document::{Document, ElementData, NodeId, NodeKind};
pub use errors::DomError;
pub use escape::{escape_identifier, escape_string};
pub use query::CompiledSelector;
pub use snapshot::{DomSnapshot, SnapshotElement, SnapshotNode};
pub use text::{normalize_text, strip_punctuation, text_sample, truncate_chars};

pub use noteanchor_core_types::{DocumentGeneration, Point, Rect, Viewport};
