//! # Generator Settings
//!
//! Fixed signal devices shared by every rung of a run. Passed into the
//! generator by value; nothing here is global.

use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    /// Run permit; every stage is gated on it.
    pub pause_signal: String,
    pub always_on: String,
    pub always_off: String,
    /// Forces sensor-driven stages through during commissioning.
    pub debug_test: String,
    /// Clears process completion latches.
    pub soft_reset_signal: String,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            pause_signal: "M0".to_string(),
            always_on: "SM400".to_string(),
            always_off: "SM401".to_string(),
            debug_test: "M1".to_string(),
            soft_reset_signal: "M2".to_string(),
        }
    }
}

impl GeneratorSettings {
    /// Parse settings from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, GenerationError> {
        Ok(toml::from_str(source)?)
    }
}
