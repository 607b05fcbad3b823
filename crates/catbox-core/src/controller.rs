//! Animation controller
//!
//! Owns the scene, the scheduler, the litter loop and the cat rig, and is
//! driven by the host frame loop through [`AnimationController::advance`].
//! Visibility changes published by the scene pause and resume the whole
//! scheduler.

use crate::config::ShowConfig;
use crate::litter::LitterPulseLoop;
use crate::props::{TransformOrigin, VisualState};
use crate::rig::CatRig;
use crate::scene::{Scene, VisibilityChange};
use crate::scheduler::{Scheduler, SchedulerEvent};
use crate::tween::TimePoint;
use crate::Result;
use crossbeam_channel::Receiver;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info, trace, warn};

/// State of one element at snapshot time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementSnapshot {
    /// Element name
    pub name: String,
    /// Animatable properties
    #[serde(flatten)]
    pub state: VisualState,
    /// Pivot
    pub origin: TransformOrigin,
}

/// Every element's state at one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSnapshot {
    /// Scheduler time in seconds
    pub time: TimePoint,
    /// Whether the scheduler is paused
    pub paused: bool,
    /// Whether the display is hidden
    pub hidden: bool,
    /// Litter rounds issued so far
    pub rounds: u64,
    /// All elements in scene order
    pub elements: Vec<ElementSnapshot>,
}

/// Owner of all running animation state
#[derive(Debug)]
pub struct AnimationController {
    scene: Scene,
    scheduler: Scheduler,
    litter: LitterPulseLoop,
    rig: CatRig,
    visibility: Receiver<VisibilityChange>,
    started: bool,
}

fn make_rng(seed: Option<u64>, stream: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream)),
        None => StdRng::from_os_rng(),
    }
}

impl AnimationController {
    /// Build the stock cat illustration and resolve every animated element
    pub fn new(config: &ShowConfig) -> Result<Self> {
        Self::with_scene(Scene::cat_illustration(&config.scene), config)
    }

    /// Use an existing scene; fails on invalid config or a missing element
    pub fn with_scene(mut scene: Scene, config: &ShowConfig) -> Result<Self> {
        config.validate()?;
        let particles = scene.select_children(&config.scene.litter_groups)?;
        let litter = LitterPulseLoop::new(config.litter.clone(), particles, make_rng(config.seed, 0))?;
        let rig = CatRig::new(config.rig.clone(), &scene, make_rng(config.seed, 1))?;
        let visibility = scene.subscribe_visibility();

        let mut scheduler = Scheduler::new();
        if scene.is_hidden() {
            scheduler.pause();
        }

        if config.litter.pulse_duration() > config.litter.interval {
            debug!(
                "Litter pulse ({:.2}s) outlasts the round interval ({:.2}s); pulses will be cut short",
                config.litter.pulse_duration(),
                config.litter.interval
            );
        }

        Ok(Self {
            scene,
            scheduler,
            litter,
            rig,
            visibility,
            started: false,
        })
    }

    /// Start the rig and the litter loop
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        self.rig.start(&mut self.scheduler, &mut self.scene);
        self.litter.start(&mut self.scheduler, &mut self.scene);
        info!("Animation started at {:.3}s", self.scheduler.now());
    }

    /// Stop the litter loop and every rig animation
    pub fn stop(&mut self) {
        if !self.started {
            return;
        }
        self.started = false;
        self.litter.stop(&mut self.scheduler);
        self.rig.stop(&mut self.scheduler);
        self.scheduler.kill_all();
        info!("Animation stopped at {:.3}s", self.scheduler.now());
    }

    /// Freeze every animation
    pub fn pause_all(&mut self) {
        self.scheduler.pause();
    }

    /// Continue every animation from where it was frozen
    pub fn resume_all(&mut self) {
        self.scheduler.resume();
    }

    /// Whether animations are frozen
    pub fn is_paused(&self) -> bool {
        self.scheduler.is_paused()
    }

    /// Whether [`start`](Self::start) has run since the last stop
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Forward a host visibility change to the scene
    pub fn set_hidden(&mut self, hidden: bool) {
        self.scene.set_hidden(hidden);
    }

    /// Host frame tick
    pub fn advance(&mut self, dt: TimePoint) {
        self.apply_visibility();
        if self.scheduler.is_paused() {
            trace!("Frame skipped while paused");
            return;
        }
        if !(dt.is_finite() && dt >= 0.0) {
            warn!("Ignoring invalid frame delta {}", dt);
            return;
        }

        let until = self.scheduler.now() + dt;
        loop {
            let events = self.scheduler.advance_to(&mut self.scene, until);
            for event in events {
                self.dispatch(event);
            }
            if self.scheduler.now() >= until {
                break;
            }
        }
    }

    fn apply_visibility(&mut self) {
        while let Ok(change) = self.visibility.try_recv() {
            match change {
                VisibilityChange::Hidden => {
                    info!("Display hidden, pausing animation");
                    self.pause_all();
                }
                VisibilityChange::Visible => {
                    info!("Display visible, resuming animation");
                    self.resume_all();
                }
            }
        }
    }

    fn dispatch(&mut self, event: SchedulerEvent) {
        match event {
            SchedulerEvent::DelayedCall(id) => {
                self.litter
                    .on_delayed_call(id, &mut self.scheduler, &mut self.scene);
            }
            SchedulerEvent::Completed { .. } => {
                self.rig.handle_event(event, &mut self.scheduler, &mut self.scene);
            }
        }
    }

    /// Capture every element's current state
    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            time: self.scheduler.now(),
            paused: self.scheduler.is_paused(),
            hidden: self.scene.is_hidden(),
            rounds: self.litter.rounds(),
            elements: self
                .scene
                .iter()
                .map(|(_, element)| ElementSnapshot {
                    name: element.name.clone(),
                    state: element.state,
                    origin: element.origin,
                })
                .collect(),
        }
    }

    /// The scene
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The scheduler
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// The litter loop
    pub fn litter(&self) -> &LitterPulseLoop {
        &self.litter
    }

    /// The cat rig
    pub fn rig(&self) -> &CatRig {
        &self.rig
    }
}
