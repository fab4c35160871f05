//! Configuration model
//!
//! One YAML document with a section per engine. Every field has a default, so
//! partial files are fine.

use anchor_locator::{LocatorPolicy, SignaturePolicy};
use anchor_placement::PlacementPolicy;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub locator: LocatorPolicy,
    pub signature: SignaturePolicy,
    pub placement: PlacementPolicy,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if !(self.locator.position_tolerance >= 0.0) {
            bail!("locator.position_tolerance must be a non-negative number");
        }
        if !(0.0..=1.0).contains(&self.signature.similarity_threshold) {
            bail!("signature.similarity_threshold must lie in [0, 1]");
        }
        self.placement.validate()?;
        Ok(())
    }
}
