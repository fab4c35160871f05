//! NoteAnchor CLI library
//!
//! Exposes the command-line front end and its configuration for integration
//! testing.

pub mod cli;
pub mod config;

pub use config::Config;
