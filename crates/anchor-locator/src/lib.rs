//! Anchor locator - durable element descriptors and multi-strategy re-location
//!
//! This crate implements:
//! - Selector generation (identifier, stable classes, positional path)
//! - Descriptor capture with element context and parent chain
//! - A six-tier locate cascade with deterministic disambiguation
//! - Identity marks scoped to one document generation
//! - Structural signatures for re-finding elements across viewport changes

pub mod capture;
pub mod classes;
pub mod disambiguate;
pub mod errors;
pub mod generator;
pub mod identity;
pub mod metrics;
pub mod policy;
pub mod resolver;
pub mod signature;
pub mod strategies;
pub mod types;

pub use capture::capture;
pub use classes::{is_durable_selector, is_stable_class, TOOL_CLASS_PREFIX};
pub use errors::LocatorError;
pub use generator::generate;
pub use identity::IdentityMarks;
pub use policy::{LocatorPolicy, SignaturePolicy};
pub use resolver::ElementLocator;
pub use signature::{similarity, Signature, SignatureMatch, SignatureMatcher, SignatureTier};
pub use strategies::{default_chain, Strategy};
pub use types::*;
