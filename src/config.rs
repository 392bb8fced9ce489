//! Engine configuration
//!
//! Pacing and stage geometry, loadable from a JSON file. Every field has a
//! default so partial files are accepted.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::scene::StageConfig;

/// Pauses inserted between visible actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pacing {
    /// Pause after each move and after each completed repeat iteration.
    pub step_ms: u64,
    /// Pause after the target is eaten.
    pub celebration_ms: u64,
}

impl Pacing {
    /// No pauses at all.
    pub const fn instant() -> Self {
        Self {
            step_ms: 0,
            celebration_ms: 0,
        }
    }

    /// Pause after a move or a repeat iteration.
    pub fn step(&self) -> Duration {
        Duration::from_millis(self.step_ms)
    }

    /// Pause after a successful eat.
    pub fn celebration(&self) -> Duration {
        Duration::from_millis(self.celebration_ms)
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            step_ms: 300,
            celebration_ms: 1000,
        }
    }
}

/// Configuration for the engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Action pacing
    pub pacing: Pacing,

    /// Geometry of the built-in stage
    pub stage: StageConfig,
}

impl EngineConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path)
            .with_context(|| format!("Failed to read engine config: {:?}", path))?;
        let config: EngineConfig = serde_json::from_slice(&data)
            .with_context(|| format!("Failed to parse engine config: {:?}", path))?;
        Ok(config)
    }

    /// Write configuration as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)
            .context("Failed to encode engine config")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write engine config: {:?}", path))?;
        Ok(())
    }
}
