//! Show configuration
//!
//! One TOML file with optional `[scene]`, `[litter]`, `[rig]`, `[runner]`
//! and `[log]` sections. Missing values fall back to the stock show.

use crate::litter::LitterConfig;
use crate::logging::LogConfig;
use crate::rig::RigConfig;
use crate::scene::SceneConfig;
use crate::tween::TimePoint;
use crate::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Headless runner settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Simulated frames per second
    pub fps: u32,
    /// Length of the run in seconds
    pub duration: TimePoint,
    /// Emit a snapshot every n-th frame
    pub every: u32,
    /// Sleep between frames to match wall-clock time
    pub realtime: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            fps: 60,
            duration: 5.0,
            every: 1,
            realtime: false,
        }
    }
}

impl RunnerConfig {
    /// Seconds per frame
    pub fn frame_time(&self) -> TimePoint {
        1.0 / self.fps as TimePoint
    }

    /// Check the runner can make progress
    pub fn validate(&self) -> Result<()> {
        if self.fps == 0 || self.every == 0 {
            return Err(CoreError::InvalidConfig(
                "runner: fps and every must be at least 1".to_string(),
            ));
        }
        if !(self.duration.is_finite() && self.duration >= 0.0) {
            return Err(CoreError::InvalidConfig(
                "runner: duration must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Complete show configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowConfig {
    /// Fixed RNG seed for reproducible runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Illustration layout
    pub scene: SceneConfig,
    /// Litter loop
    pub litter: LitterConfig,
    /// Cat rig
    pub rig: RigConfig,
    /// Headless runner
    pub runner: RunnerConfig,
    /// Logging
    pub log: LogConfig,
}

impl ShowConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: ShowConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading show config from {:?}", path);
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.scene.validate()?;
        self.litter.validate()?;
        self.rig.validate()?;
        self.runner.validate()?;
        Ok(())
    }
}
