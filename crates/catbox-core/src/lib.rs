//! Catbox Core - animation model of the litter-box cat
//!
//! This crate contains:
//! - Scene graph of the illustration and its visibility signal
//! - Tween scheduler (tweens, timelines, delayed calls, global pause)
//! - Litter pulse loop
//! - Cat rig (idle motion, poop, smell wisps, meow label)
//! - Animation controller tying them to a host frame loop
//! - Show and logging configuration

#![warn(missing_docs)]

pub use glam::Vec2;
use thiserror::Error;

pub mod config;
pub mod controller;
pub mod easing;
pub mod litter;
pub mod logging;
pub mod props;
pub mod rig;
pub mod scene;
pub mod scheduler;
pub mod tween;

// --- Re-exports grouped by category ---

// Animation primitives
pub use easing::Ease;
pub use props::{Props, TransformOrigin, VisualState};
pub use scheduler::{AnimationHandle, AnimationId, DelayedCallId, Scheduler, SchedulerEvent};
pub use tween::{Repeat, TimePoint, TweenSpec};

// Scene
pub use scene::{ElementId, Scene, SceneConfig, VisibilityChange};

// Show
pub use controller::{AnimationController, ElementSnapshot, FrameSnapshot};
pub use litter::{LitterConfig, LitterPulseLoop, PhaseConfig, PulseSample, RoundReport};
pub use rig::{CatRig, RigConfig};

// Configuration & Logging
pub use config::{RunnerConfig, ShowConfig};
pub use logging::LogConfig;

/// Core error types
#[derive(Error, Debug)]
pub enum CoreError {
    /// A named element is missing from the scene
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Configuration values are out of range
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
