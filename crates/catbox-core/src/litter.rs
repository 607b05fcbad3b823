//! Litter pulse loop
//!
//! Every `interval` seconds each litter particle is teleported to a jittered
//! spot around the anchor and plays a three-phase pulse: fade/scale in,
//! hold with a small wiggle, fade/scale out. A new pulse always cancels the
//! one still running on the same particle, so each particle has at most one
//! live pulse.
//!
//! Rounds are scheduled from round *start*, not from pulse completion. With
//! the default 0.18s interval the 0.77s pulse is cut off by the next round;
//! the stream of overlapping particles relies on that.

use crate::easing::Ease;
use crate::props::Props;
use crate::scene::{ElementId, Scene};
use crate::scheduler::{AnimationHandle, DelayedCallId, Scheduler};
use crate::tween::{TimePoint, TweenSpec};
use crate::{CoreError, Result};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, trace};

/// Opacity a particle snaps to at the start of a pulse
pub const SNAP_OPACITY: f32 = 0.0;
/// Scale a particle snaps to at the start of a pulse
pub const SNAP_SCALE: f32 = 0.6;
/// Rotation a particle snaps to at the start of a pulse
pub const SNAP_ROTATION: f32 = 0.0;

/// Duration and easing of one pulse phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseConfig {
    /// Seconds
    pub duration: TimePoint,
    /// Easing curve
    pub ease: Ease,
}

impl PhaseConfig {
    /// Create a phase config
    pub const fn new(duration: TimePoint, ease: Ease) -> Self {
        Self { duration, ease }
    }
}

const FADE_IN: PhaseConfig = PhaseConfig::new(0.14, Ease::Power1Out);
const WIGGLE: PhaseConfig = PhaseConfig::new(0.35, Ease::SineInOut);
const FADE_OUT: PhaseConfig = PhaseConfig::new(0.28, Ease::Power1In);

/// Phase table where either field may be left out
#[derive(Deserialize)]
struct PhaseOverride {
    duration: Option<TimePoint>,
    ease: Option<Ease>,
}

impl PhaseOverride {
    fn over(self, base: PhaseConfig) -> PhaseConfig {
        PhaseConfig {
            duration: self.duration.unwrap_or(base.duration),
            ease: self.ease.unwrap_or(base.ease),
        }
    }
}

fn fade_in_phase<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<PhaseConfig, D::Error> {
    PhaseOverride::deserialize(d).map(|o| o.over(FADE_IN))
}

fn wiggle_phase<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<PhaseConfig, D::Error> {
    PhaseOverride::deserialize(d).map(|o| o.over(WIGGLE))
}

fn fade_out_phase<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<PhaseConfig, D::Error> {
    PhaseOverride::deserialize(d).map(|o| o.over(FADE_OUT))
}

/// Litter loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LitterConfig {
    /// Centre of the spawn area, in illustration units
    pub anchor: Vec2,
    /// Half-extent of the spawn area on each axis
    pub jitter: Vec2,
    /// Seconds between round starts
    pub interval: TimePoint,
    /// Phase A: fade and scale in
    #[serde(deserialize_with = "fade_in_phase")]
    pub fade_in: PhaseConfig,
    /// Phase B: hold with wiggle
    #[serde(deserialize_with = "wiggle_phase")]
    pub wiggle: PhaseConfig,
    /// Phase C: fade and scale out
    #[serde(deserialize_with = "fade_out_phase")]
    pub fade_out: PhaseConfig,
    /// Range of the phase-A end scale, inclusive
    pub peak_scale: [f32; 2],
    /// Maximum absolute phase-B rotation in degrees
    pub wiggle_degrees: f32,
    /// Phase-C end scale
    pub fade_out_scale: f32,
}

impl Default for LitterConfig {
    fn default() -> Self {
        Self {
            anchor: Vec2::new(5.0, 1.0),
            jitter: Vec2::new(4.0, 3.0),
            interval: 0.18,
            fade_in: FADE_IN,
            wiggle: WIGGLE,
            fade_out: FADE_OUT,
            peak_scale: [0.95, 1.2],
            wiggle_degrees: 6.0,
            fade_out_scale: 0.8,
        }
    }
}

impl LitterConfig {
    /// Total length of one pulse
    pub fn pulse_duration(&self) -> TimePoint {
        self.fade_in.duration + self.wiggle.duration + self.fade_out.duration
    }

    /// Check the settings can drive the loop
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(CoreError::InvalidConfig(format!("litter: {}", msg)));

        if !(self.interval.is_finite() && self.interval > 0.0) {
            return invalid("interval must be a positive number of seconds");
        }
        if !self.anchor.is_finite() {
            return invalid("anchor must be finite");
        }
        if !(self.jitter.is_finite() && self.jitter.x >= 0.0 && self.jitter.y >= 0.0) {
            return invalid("jitter must be finite and non-negative");
        }
        for (name, phase) in [
            ("fade_in", self.fade_in),
            ("wiggle", self.wiggle),
            ("fade_out", self.fade_out),
        ] {
            if !(phase.duration.is_finite() && phase.duration > 0.0) {
                return invalid(&format!("{} duration must be positive", name));
            }
        }
        let [lo, hi] = self.peak_scale;
        if !(lo.is_finite() && hi.is_finite() && lo >= 0.0 && lo <= hi) {
            return invalid("peak_scale must be an ordered, non-negative [min, max] pair");
        }
        if !(self.fade_out_scale.is_finite() && self.fade_out_scale >= 0.0) {
            return invalid("fade_out_scale must be finite and non-negative");
        }
        if !(self.wiggle_degrees.is_finite() && self.wiggle_degrees >= 0.0) {
            return invalid("wiggle_degrees must be non-negative");
        }
        Ok(())
    }
}

/// Random values drawn for one pulse
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PulseSample {
    /// Particle the pulse plays on
    pub particle: ElementId,
    /// Teleport position
    pub position: Vec2,
    /// Phase-A end scale
    pub peak_scale: f32,
    /// Phase-B end rotation in degrees
    pub wiggle_rotation: f32,
}

/// Summary of one issued round
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundReport {
    /// Round number, starting at 1
    pub round: u64,
    /// Scheduler time the round was issued at
    pub started_at: TimePoint,
    /// One sample per particle, in pool order
    pub samples: Vec<PulseSample>,
}

/// Uniform draw from the closed interval `[lo, hi]`
fn uniform(rng: &mut StdRng, lo: f32, hi: f32) -> f32 {
    if lo >= hi {
        return lo;
    }
    rng.random_range(lo..=hi)
}

/// Drives litter pulse rounds over a fixed particle pool
#[derive(Debug)]
pub struct LitterPulseLoop {
    config: LitterConfig,
    particles: Vec<ElementId>,
    /// Particle -> its latest pulse
    registry: HashMap<ElementId, AnimationHandle>,
    round_timer: Option<DelayedCallId>,
    rng: StdRng,
    rounds: u64,
    last_round: Option<RoundReport>,
}

impl LitterPulseLoop {
    /// Create a stopped loop over `particles`
    pub fn new(config: LitterConfig, particles: Vec<ElementId>, rng: StdRng) -> Result<Self> {
        config.validate()?;
        if particles.is_empty() {
            return Err(CoreError::InvalidConfig(
                "litter: particle pool is empty".to_string(),
            ));
        }
        Ok(Self {
            config,
            particles,
            registry: HashMap::new(),
            round_timer: None,
            rng,
            rounds: 0,
            last_round: None,
        })
    }

    /// Loop settings
    pub fn config(&self) -> &LitterConfig {
        &self.config
    }

    /// The particle pool
    pub fn particles(&self) -> &[ElementId] {
        &self.particles
    }

    /// Whether a next round is armed
    pub fn is_running(&self) -> bool {
        self.round_timer.is_some()
    }

    /// Number of rounds issued so far
    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    /// Report of the most recent round
    pub fn last_round(&self) -> Option<&RoundReport> {
        self.last_round.as_ref()
    }

    /// Latest pulse handle of a particle
    pub fn pulse_of(&self, particle: ElementId) -> Option<&AnimationHandle> {
        self.registry.get(&particle)
    }

    /// Issue the first round now and keep issuing rounds every `interval`
    pub fn start(&mut self, scheduler: &mut Scheduler, scene: &mut Scene) {
        if self.is_running() {
            return;
        }
        info!(
            "Starting litter loop: {} particle(s), interval {:.3}s",
            self.particles.len(),
            self.config.interval
        );
        self.next_round(scheduler, scene);
    }

    /// Cancel the pending round and every live pulse
    pub fn stop(&mut self, scheduler: &mut Scheduler) {
        if let Some(timer) = self.round_timer.take() {
            scheduler.cancel_delayed_call(timer);
        }
        for (_, handle) in self.registry.drain() {
            handle.cancel();
        }
        info!("Litter loop stopped after {} round(s)", self.rounds);
    }

    /// React to a fired delayed call; returns whether it was this loop's timer
    pub fn on_delayed_call(
        &mut self,
        id: DelayedCallId,
        scheduler: &mut Scheduler,
        scene: &mut Scene,
    ) -> bool {
        if self.round_timer != Some(id) {
            return false;
        }
        self.round_timer = None;
        self.next_round(scheduler, scene);
        true
    }

    fn next_round(&mut self, scheduler: &mut Scheduler, scene: &mut Scene) {
        self.run_pulse_round(scheduler, scene);
        // Measured from round start, independent of pulse length
        self.round_timer = Some(scheduler.delayed_call(self.config.interval));
    }

    /// Issue one pulse on every particle
    pub fn run_pulse_round(&mut self, scheduler: &mut Scheduler, scene: &mut Scene) -> &RoundReport {
        self.rounds += 1;
        let mut samples = Vec::with_capacity(self.particles.len());
        for i in 0..self.particles.len() {
            let particle = self.particles[i];
            let (_, sample) = self.play_pulse(particle, scheduler, scene);
            samples.push(sample);
        }

        let report = RoundReport {
            round: self.rounds,
            started_at: scheduler.now(),
            samples,
        };
        debug!(
            "Litter round {} at {:.3}s ({} pulses)",
            report.round,
            report.started_at,
            report.samples.len()
        );
        self.last_round.insert(report)
    }

    /// Cancel the particle's running pulse and start a fresh one
    pub fn play_pulse(
        &mut self,
        particle: ElementId,
        scheduler: &mut Scheduler,
        scene: &mut Scene,
    ) -> (AnimationHandle, PulseSample) {
        if let Some(previous) = self.registry.remove(&particle) {
            previous.cancel();
        }

        let sample = self.sample(particle);
        scheduler.set(
            scene,
            particle,
            Props::new()
                .position(sample.position.x, sample.position.y)
                .opacity(SNAP_OPACITY)
                .scale(SNAP_SCALE)
                .rotation(SNAP_ROTATION),
        );

        let c = &self.config;
        let phases = vec![
            TweenSpec::to(Props::new().opacity(1.0).scale(sample.peak_scale))
                .duration(c.fade_in.duration)
                .ease(c.fade_in.ease),
            TweenSpec::to(Props::new().rotation(sample.wiggle_rotation))
                .duration(c.wiggle.duration)
                .ease(c.wiggle.ease),
            TweenSpec::to(Props::new().opacity(0.0).scale(c.fade_out_scale))
                .duration(c.fade_out.duration)
                .ease(c.fade_out.ease),
        ];
        let handle = scheduler.timeline(scene, particle, phases);
        trace!(
            "Pulse {:?} on {} at ({:.2}, {:.2})",
            handle.id(),
            scene.name(particle),
            sample.position.x,
            sample.position.y
        );

        self.registry.insert(particle, handle.clone());
        (handle, sample)
    }

    fn sample(&mut self, particle: ElementId) -> PulseSample {
        let LitterConfig {
            anchor,
            jitter,
            peak_scale: [scale_lo, scale_hi],
            wiggle_degrees,
            ..
        } = self.config;

        let position = Vec2::new(
            anchor.x + uniform(&mut self.rng, -jitter.x, jitter.x),
            anchor.y + uniform(&mut self.rng, -jitter.y, jitter.y),
        );
        PulseSample {
            particle,
            position,
            peak_scale: uniform(&mut self.rng, scale_lo, scale_hi),
            wiggle_rotation: uniform(&mut self.rng, -wiggle_degrees, wiggle_degrees),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn setup(particles: usize, config: LitterConfig) -> (Scene, Scheduler, LitterPulseLoop) {
        let mut scene = Scene::new();
        let group = scene.add_element("litter", None);
        for i in 0..particles {
            scene.add_element(format!("litter/path_{}", i), Some(group));
        }
        let pool = scene.children(group).to_vec();
        let litter = LitterPulseLoop::new(config, pool, StdRng::seed_from_u64(7)).unwrap();
        (scene, Scheduler::new(), litter)
    }

    #[test]
    fn test_default_config_matches_show_constants() {
        let config = LitterConfig::default();
        assert_eq!(config.anchor, Vec2::new(5.0, 1.0));
        assert_eq!(config.jitter, Vec2::new(4.0, 3.0));
        assert_eq!(config.interval, 0.18);
        assert!((config.pulse_duration() - 0.77).abs() < 1e-9);
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            LitterConfig {
                interval: 0.0,
                ..Default::default()
            },
            LitterConfig {
                interval: f64::NAN,
                ..Default::default()
            },
            LitterConfig {
                jitter: Vec2::new(-1.0, 0.0),
                ..Default::default()
            },
            LitterConfig {
                peak_scale: [1.2, 0.95],
                ..Default::default()
            },
            LitterConfig {
                wiggle: PhaseConfig::new(0.0, Ease::SineInOut),
                ..Default::default()
            },
            LitterConfig {
                peak_scale: [-5.0, -1.0],
                ..Default::default()
            },
            LitterConfig {
                fade_out_scale: f32::NAN,
                ..Default::default()
            },
            LitterConfig {
                fade_out_scale: -0.5,
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(matches!(config.validate(), Err(CoreError::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_empty_pool_is_rejected() {
        let err = LitterPulseLoop::new(LitterConfig::default(), vec![], StdRng::seed_from_u64(1))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig(_)));
    }

    #[test]
    fn test_snap_resets_particle_before_phase_a() {
        let (mut scene, mut scheduler, mut litter) = setup(2, LitterConfig::default());
        let particle = litter.particles()[0];
        {
            let state = scene.state_mut(particle);
            state.opacity = 0.7;
            state.rotation = 40.0;
        }

        let (_, sample) = litter.play_pulse(particle, &mut scheduler, &mut scene);

        let state = scene.state(particle);
        assert_eq!(state.opacity, 0.0);
        assert_eq!(state.scale, SNAP_SCALE);
        assert_eq!(state.rotation, 0.0);
        assert_eq!(state.x, sample.position.x);
        assert_eq!(state.y, sample.position.y);
    }

    #[test]
    fn test_pulse_phases_follow_samples() {
        let (mut scene, mut scheduler, mut litter) = setup(1, LitterConfig::default());
        let particle = litter.particles()[0];
        let (handle, sample) = litter.play_pulse(particle, &mut scheduler, &mut scene);

        // End of phase A
        scheduler.advance_to(&mut scene, 0.14);
        let state = *scene.state(particle);
        assert!((state.opacity - 1.0).abs() < 1e-5);
        assert!((state.scale - sample.peak_scale).abs() < 1e-5);
        assert_eq!(state.rotation, 0.0);

        // End of phase B: rotated, position unchanged
        scheduler.advance_to(&mut scene, 0.49);
        let state = *scene.state(particle);
        assert!((state.rotation - sample.wiggle_rotation).abs() < 1e-4);
        assert_eq!(state.x, sample.position.x);

        let events = scheduler.advance_to(&mut scene, 1.0);
        assert_eq!(events.len(), 1);
        let state = *scene.state(particle);
        assert_eq!(state.opacity, 0.0);
        assert_eq!(state.scale, 0.8);
        assert!(!handle.is_cancelled());
    }

    #[test]
    fn test_new_pulse_cancels_previous() {
        let (mut scene, mut scheduler, mut litter) = setup(1, LitterConfig::default());
        let particle = litter.particles()[0];

        let (first, _) = litter.play_pulse(particle, &mut scheduler, &mut scene);
        scheduler.advance_to(&mut scene, 0.1);
        let (second, _) = litter.play_pulse(particle, &mut scheduler, &mut scene);

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert_eq!(scheduler.active_on(particle), 1);
        assert_eq!(litter.pulse_of(particle).map(|h| h.id()), Some(second.id()));
    }

    #[test]
    fn test_round_covers_every_particle() {
        let (mut scene, mut scheduler, mut litter) = setup(4, LitterConfig::default());
        let report = litter.run_pulse_round(&mut scheduler, &mut scene).clone();

        assert_eq!(report.round, 1);
        assert_eq!(report.samples.len(), 4);
        let sampled: Vec<_> = report.samples.iter().map(|s| s.particle).collect();
        assert_eq!(sampled, litter.particles());
        for &p in litter.particles() {
            assert_eq!(scheduler.active_on(p), 1);
        }
    }

    #[test]
    fn test_zero_jitter_pins_to_anchor() {
        let config = LitterConfig {
            jitter: Vec2::ZERO,
            ..Default::default()
        };
        let (mut scene, mut scheduler, mut litter) = setup(3, config);
        let report = litter.run_pulse_round(&mut scheduler, &mut scene);
        for s in &report.samples {
            assert_eq!(s.position, Vec2::new(5.0, 1.0));
        }
    }

    #[test]
    fn test_stop_cancels_timer_and_pulses() {
        let (mut scene, mut scheduler, mut litter) = setup(2, LitterConfig::default());
        litter.start(&mut scheduler, &mut scene);
        assert!(litter.is_running());
        assert_eq!(scheduler.next_due(), Some(0.18));

        litter.stop(&mut scheduler);
        assert!(!litter.is_running());
        assert_eq!(scheduler.next_due(), None);
        assert_eq!(scheduler.active_count(), 0);
    }
}
