//! Cat rig: idle motion of the body parts, the poop pop-in, the looping
//! smell wisps and the "meow" label.
//!
//! Everything here is a plain tween with fixed parameters; the only state
//! kept is which follow-up to start when a wisp or the label finishes.

use crate::easing::Ease;
use crate::props::{Props, TransformOrigin};
use crate::scene::{names, ElementId, Scene};
use crate::scheduler::{AnimationHandle, AnimationId, Scheduler, SchedulerEvent};
use crate::tween::{TimePoint, TweenSpec};
use crate::{CoreError, Result};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const TAIL_SWAY: f32 = 6.0;
const HEAD_BOB: f32 = -0.8;
const FRONT_LEG_SWAY: f32 = -3.0;
const KICK_SHARE: f64 = 0.45;
const WISP_STAGGER: TimePoint = 0.35;
const WISP_RISE_BASE: TimePoint = 2.0;
const WISP_RISE_SPREAD: TimePoint = 0.6;
const POP_EASE: Ease = Ease::BackOut(1.7);

/// Rig timing knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    /// Full back-leg kick rhythm in seconds
    pub kick_duration: TimePoint,
    /// Back leg 1 peak rotation in degrees
    pub kick_1_max: f32,
    /// Back leg 2 peak rotation in degrees
    pub kick_2_max: f32,
    /// Horizontal pull-back during kicks
    pub kick_bias_x: f32,
    /// Offset of the second leg's kick
    pub kick_2_delay: TimePoint,
    /// Delay before the poop pops in
    pub poop_delay: TimePoint,
    /// Delay before the "meow" label pops in
    pub meow_delay: TimePoint,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            kick_duration: 0.55,
            kick_1_max: 48.0,
            kick_2_max: 54.0,
            kick_bias_x: -3.0,
            kick_2_delay: 0.1,
            poop_delay: 1.1,
            meow_delay: 1.4,
        }
    }
}

impl RigConfig {
    /// Check durations and delays
    pub fn validate(&self) -> Result<()> {
        if !(self.kick_duration.is_finite() && self.kick_duration > 0.0) {
            return Err(CoreError::InvalidConfig(
                "rig: kick_duration must be positive".to_string(),
            ));
        }
        for (name, delay) in [
            ("kick_2_delay", self.kick_2_delay),
            ("poop_delay", self.poop_delay),
            ("meow_delay", self.meow_delay),
        ] {
            if !(delay.is_finite() && delay >= 0.0) {
                return Err(CoreError::InvalidConfig(format!(
                    "rig: {} must be non-negative",
                    name
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WispStage {
    Rising,
    Fading,
}

#[derive(Debug)]
struct Wisp {
    element: ElementId,
    rise_duration: TimePoint,
    delay: TimePoint,
    stage: WispStage,
    current: Option<AnimationHandle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MeowStage {
    PopIn,
    Floating,
}

/// Non-litter animations of the cat
#[derive(Debug)]
pub struct CatRig {
    config: RigConfig,
    head: ElementId,
    tail: ElementId,
    front_legs: ElementId,
    back_leg_1: ElementId,
    back_leg_2: ElementId,
    poop: ElementId,
    wisps: Vec<Wisp>,
    meow: Option<ElementId>,
    meow_anim: Option<(MeowStage, AnimationHandle)>,
    rng: StdRng,
    started: bool,
}

impl CatRig {
    /// Resolve the rig's elements in `scene`
    pub fn new(config: RigConfig, scene: &Scene, rng: StdRng) -> Result<Self> {
        config.validate()?;
        let smell = scene.require(names::POOP_SMELL)?;
        let wisps = scene
            .children(smell)
            .iter()
            .enumerate()
            .map(|(i, &element)| Wisp {
                element,
                rise_duration: WISP_RISE_BASE,
                delay: i as TimePoint * WISP_STAGGER,
                stage: WispStage::Rising,
                current: None,
            })
            .collect();

        Ok(Self {
            config,
            head: scene.require(names::HEAD)?,
            tail: scene.require(names::BACK_AND_TAIL)?,
            front_legs: scene.require(names::FRONT_LEGS)?,
            back_leg_1: scene.require(names::BACK_LEG_1)?,
            back_leg_2: scene.require(names::BACK_LEG_2)?,
            poop: scene.require(names::POOP)?,
            wisps,
            meow: scene.find(names::MEOW),
            meow_anim: None,
            rng,
            started: false,
        })
    }

    /// Whether [`start`](Self::start) has run since the last stop
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Every element the rig animates
    pub fn elements(&self) -> Vec<ElementId> {
        let mut all = vec![
            self.head,
            self.tail,
            self.front_legs,
            self.back_leg_1,
            self.back_leg_2,
            self.poop,
        ];
        all.extend(self.wisps.iter().map(|w| w.element));
        all.extend(self.meow);
        all
    }

    /// Start every rig animation
    pub fn start(&mut self, scheduler: &mut Scheduler, scene: &mut Scene) {
        if self.started {
            return;
        }
        self.started = true;
        self.start_idle(scheduler, scene);
        self.start_poop(scheduler, scene);
        self.start_smell(scheduler, scene);
        self.start_meow(scheduler, scene);
        info!(
            "Cat rig started ({} wisp(s), meow: {})",
            self.wisps.len(),
            self.meow.is_some()
        );
    }

    /// Kill every rig animation
    pub fn stop(&mut self, scheduler: &mut Scheduler) {
        for element in self.elements() {
            scheduler.kill_tweens_of(element);
        }
        for wisp in &mut self.wisps {
            wisp.current = None;
            wisp.stage = WispStage::Rising;
        }
        self.meow_anim = None;
        self.started = false;
    }

    fn start_idle(&mut self, scheduler: &mut Scheduler, scene: &mut Scene) {
        for part in [
            self.tail,
            self.front_legs,
            self.back_leg_1,
            self.back_leg_2,
            self.head,
        ] {
            scene.set_origin(part, TransformOrigin::default());
        }

        scheduler.tween(
            scene,
            self.tail,
            TweenSpec::to(Props::new().rotation(TAIL_SWAY))
                .duration(0.6)
                .ease(Ease::SineInOut)
                .yoyo_forever(),
        );
        scheduler.tween(
            scene,
            self.head,
            TweenSpec::to(Props::new().y(HEAD_BOB))
                .duration(1.2)
                .ease(Ease::SineInOut)
                .yoyo_forever(),
        );

        let kick = self.config.kick_duration * KICK_SHARE;
        for (leg, max, delay) in [
            (self.back_leg_1, self.config.kick_1_max, 0.0),
            (self.back_leg_2, self.config.kick_2_max, self.config.kick_2_delay),
        ] {
            scene.set_origin(leg, TransformOrigin::percent(15.0, 50.0));
            scheduler.tween(
                scene,
                leg,
                TweenSpec::to(Props::new().rotation(max).x(self.config.kick_bias_x))
                    .duration(kick)
                    .delay(delay)
                    .ease(Ease::Power2InOut)
                    .yoyo_forever(),
            );
        }

        scene.set_origin(self.front_legs, TransformOrigin::percent(60.0, 50.0));
        scheduler.tween(
            scene,
            self.front_legs,
            TweenSpec::to(Props::new().rotation(FRONT_LEG_SWAY))
                .duration(0.7)
                .ease(Ease::SineInOut)
                .yoyo_forever(),
        );
    }

    fn start_poop(&mut self, scheduler: &mut Scheduler, scene: &mut Scene) {
        scheduler.set(scene, self.poop, Props::new().scale(0.6).opacity(0.0).y(8.0));
        scene.set_origin(self.poop, TransformOrigin::percent(50.0, 100.0));
        scheduler.tween(
            scene,
            self.poop,
            TweenSpec::to(Props::new().scale(1.0).opacity(1.0).y(0.0))
                .duration(0.6)
                .delay(self.config.poop_delay)
                .ease(POP_EASE),
        );
    }

    fn start_smell(&mut self, scheduler: &mut Scheduler, scene: &mut Scene) {
        for i in 0..self.wisps.len() {
            // Drawn once per wisp, reused on every loop
            self.wisps[i].rise_duration =
                WISP_RISE_BASE + self.rng.random::<f64>() * WISP_RISE_SPREAD;
            self.rise_wisp(i, scheduler, scene);
        }
    }

    fn rise_wisp(&mut self, index: usize, scheduler: &mut Scheduler, scene: &mut Scene) {
        let wisp = &mut self.wisps[index];
        let handle = scheduler.tween(
            scene,
            wisp.element,
            TweenSpec::from_to(
                Props::new().opacity(0.0).y(8.0),
                Props::new().opacity(1.0).y(-24.0),
            )
            .duration(wisp.rise_duration)
            .delay(wisp.delay)
            .ease(Ease::SineInOut),
        );
        wisp.stage = WispStage::Rising;
        wisp.current = Some(handle);
    }

    fn fade_wisp(&mut self, index: usize, scheduler: &mut Scheduler, scene: &mut Scene) {
        let wisp = &mut self.wisps[index];
        let handle = scheduler.tween(
            scene,
            wisp.element,
            TweenSpec::to(Props::new().opacity(0.0).y(-36.0))
                .duration(0.8)
                .ease(Ease::Power1In),
        );
        wisp.stage = WispStage::Fading;
        wisp.current = Some(handle);
    }

    fn start_meow(&mut self, scheduler: &mut Scheduler, scene: &mut Scene) {
        let Some(meow) = self.meow else {
            return;
        };
        scheduler.set(scene, meow, Props::new().scale(0.0).opacity(0.0));
        scene.set_origin(meow, TransformOrigin::default());
        let handle = scheduler.tween(
            scene,
            meow,
            TweenSpec::to(Props::new().scale(1.2).opacity(1.0))
                .duration(0.5)
                .delay(self.config.meow_delay)
                .ease(POP_EASE),
        );
        self.meow_anim = Some((MeowStage::PopIn, handle));
    }

    fn is_current(handle: &Option<AnimationHandle>, id: AnimationId) -> bool {
        handle.as_ref().is_some_and(|h| h.id() == id)
    }

    /// Start follow-up animations; returns whether the event belonged to the rig
    pub fn handle_event(
        &mut self,
        event: SchedulerEvent,
        scheduler: &mut Scheduler,
        scene: &mut Scene,
    ) -> bool {
        let SchedulerEvent::Completed { id, .. } = event else {
            return false;
        };

        if let Some(index) = self
            .wisps
            .iter()
            .position(|w| Self::is_current(&w.current, id))
        {
            match self.wisps[index].stage {
                WispStage::Rising => self.fade_wisp(index, scheduler, scene),
                WispStage::Fading => self.rise_wisp(index, scheduler, scene),
            }
            return true;
        }

        let popped_in = matches!(
            &self.meow_anim,
            Some((MeowStage::PopIn, handle)) if handle.id() == id
        );
        match self.meow {
            Some(meow) if popped_in => {
                debug!("Meow label settled, floating");
                let float = scheduler.tween(
                    scene,
                    meow,
                    TweenSpec::to(Props::new().y(-2.0).scale(1.0))
                        .duration(1.2)
                        .ease(Ease::SineInOut)
                        .yoyo_forever(),
                );
                self.meow_anim = Some((MeowStage::Floating, float));
                true
            }
            _ => false,
        }
    }
}
