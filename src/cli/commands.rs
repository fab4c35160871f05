use clap::Subcommand;

use super::capture::CaptureArgs;
use super::config::ConfigArgs;
use super::locate::LocateArgs;
use super::place::PlaceArgs;
use super::signature::SignatureArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Capture a durable descriptor for an element in a DOM snapshot
    Capture(CaptureArgs),

    /// Re-locate a stored descriptor in a DOM snapshot
    Locate(LocateArgs),

    /// Take a structural signature in one snapshot and find it in another
    Signature(SignatureArgs),

    /// Locate every descriptor and lay out their note markers
    Place(PlaceArgs),

    /// Configuration management
    Config(ConfigArgs),
}
