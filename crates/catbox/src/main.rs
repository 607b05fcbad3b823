//! Catbox - animated litter-box cat
//!
//! Runs the show headless and prints one JSON frame snapshot per line.

#![warn(missing_docs)]

mod logging_setup;
mod runner;

use anyhow::{Context, Result};
use catbox_core::{AnimationController, ShowConfig, TimePoint};
use clap::Parser;
use runner::VisibilityScript;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::info;

/// Command line options; flags override the config file
#[derive(Debug, Parser)]
#[command(name = "catbox", version, about = "Animated litter-box cat, driven headless")]
struct Cli {
    /// Show config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seconds of host time to run
    #[arg(short, long)]
    duration: Option<TimePoint>,

    /// Simulated frames per second
    #[arg(long)]
    fps: Option<u32>,

    /// Fixed RNG seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Hide the display at this host time
    #[arg(long, value_name = "SECS")]
    hide_at: Option<TimePoint>,

    /// Show the display again at this host time
    #[arg(long, value_name = "SECS")]
    show_at: Option<TimePoint>,

    /// Emit every n-th frame
    #[arg(long, value_name = "N")]
    every: Option<u32>,

    /// Sleep between frames to match wall-clock time
    #[arg(long)]
    realtime: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn show_config(&self) -> Result<ShowConfig> {
        let mut config = match &self.config {
            Some(path) => ShowConfig::load(path)
                .with_context(|| format!("Failed to load config from {:?}", path))?,
            None => ShowConfig::default(),
        };

        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(duration) = self.duration {
            config.runner.duration = duration;
        }
        if let Some(fps) = self.fps {
            config.runner.fps = fps;
        }
        if let Some(every) = self.every {
            config.runner.every = every;
        }
        if self.realtime {
            config.runner.realtime = true;
        }
        if let Some(level) = &self.log_level {
            config.log.level = level.clone();
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.show_config()?;

    let _log_guard = logging_setup::init(&config.log)?;
    info!("=== Catbox session started ===");

    let mut controller =
        AnimationController::new(&config).context("Failed to set up the illustration")?;
    let script = VisibilityScript {
        hide_at: cli.hide_at,
        show_at: cli.show_at,
    };

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    runner::run(&mut controller, &config.runner, script, &mut out)?;

    Ok(())
}
