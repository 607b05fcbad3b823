//! Headless frame loop
//!
//! Steps an [`AnimationController`] at a fixed frame rate and writes every
//! n-th frame as one JSON line.

use anyhow::{Context, Result};
use catbox_core::{AnimationController, RunnerConfig, TimePoint};
use std::io::Write;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Scripted visibility changes
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VisibilityScript {
    /// Host time at which the display is hidden
    pub hide_at: Option<TimePoint>,
    /// Host time at which the display is shown again
    pub show_at: Option<TimePoint>,
}

impl VisibilityScript {
    /// Visibility change due in `(from, to]`, if any
    fn change_between(&self, from: TimePoint, to: TimePoint) -> Option<bool> {
        let due = |at: Option<TimePoint>| at.is_some_and(|at| at > from && at <= to);
        // Both in one frame: the later one wins
        match (due(self.hide_at), due(self.show_at)) {
            (true, true) => Some(self.hide_at > self.show_at),
            (true, false) => Some(true),
            (false, true) => Some(false),
            (false, false) => None,
        }
    }
}

/// Summary of a finished run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunStats {
    /// Frames stepped
    pub frames: u64,
    /// Snapshots written
    pub emitted: u64,
    /// Host time at the end of the run
    pub host_time: TimePoint,
}

/// Run the show for `config.duration` seconds of host time.
///
/// Host time keeps flowing while the display is hidden; the controller's
/// own clock does not.
pub fn run<W: Write>(
    controller: &mut AnimationController,
    config: &RunnerConfig,
    script: VisibilityScript,
    out: &mut W,
) -> Result<RunStats> {
    let dt = config.frame_time();
    let total_frames = (config.duration * config.fps as TimePoint).round() as u64;
    info!(
        "Running {} frame(s) at {} fps, emitting every {}",
        total_frames, config.fps, config.every
    );

    controller.start();

    let mut stats = RunStats {
        frames: 0,
        emitted: 0,
        host_time: 0.0,
    };
    let started = Instant::now();

    for frame in 1..=total_frames {
        // Frame 1 also covers changes scripted at or before time zero
        let previous = if frame == 1 {
            TimePoint::NEG_INFINITY
        } else {
            stats.host_time
        };
        stats.host_time = frame as TimePoint * dt;

        if let Some(hidden) = script.change_between(previous, stats.host_time) {
            debug!("Host visibility change at {:.3}s: hidden = {}", stats.host_time, hidden);
            controller.set_hidden(hidden);
        }

        controller.advance(dt);
        stats.frames = frame;

        if frame % config.every as u64 == 0 {
            let snapshot = controller.snapshot();
            serde_json::to_writer(&mut *out, &snapshot).context("Failed to encode snapshot")?;
            writeln!(out).context("Failed to write snapshot")?;
            stats.emitted += 1;
        }

        if config.realtime {
            let target = started + Duration::from_secs_f64(stats.host_time);
            if let Some(wait) = target.checked_duration_since(Instant::now()) {
                std::thread::sleep(wait);
            }
        }
    }

    out.flush().context("Failed to flush output")?;
    controller.stop();
    info!(
        "Run finished at {:.3}s: {} frame(s), {} snapshot(s), {} litter round(s)",
        stats.host_time,
        stats.frames,
        stats.emitted,
        controller.litter().rounds()
    );
    Ok(stats)
}
