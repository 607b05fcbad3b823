//! Tween scheduler
//!
//! Drives tweens, timelines and delayed calls from a host-supplied clock.
//! The host calls [`Scheduler::advance_to`] once per frame (or repeatedly,
//! see below); the scheduler writes interpolated properties into the
//! [`Scene`] and reports completed animations and fired delayed calls as
//! [`SchedulerEvent`]s for the caller to dispatch.
//!
//! `advance_to` never steps past the next pending delayed call, so a caller
//! that loops until `now() >= until` sees every call fire at its exact due
//! time.

use crate::props::Props;
use crate::scene::{ElementId, Scene};
use crate::tween::{TimePoint, TweenSpec};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Identifier of a running tween or timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnimationId(u64);

/// Identifier of a pending delayed call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DelayedCallId(u64);

/// Caller-side handle to a running animation.
///
/// Cancelling is idempotent and takes effect before the scheduler writes
/// the target again.
#[derive(Debug, Clone)]
pub struct AnimationHandle {
    id: AnimationId,
    target: ElementId,
    cancelled: Arc<AtomicBool>,
}

impl AnimationHandle {
    /// Id of the animation
    pub fn id(&self) -> AnimationId {
        self.id
    }

    /// Element the animation writes to
    pub fn target(&self) -> ElementId {
        self.target
    }

    /// Stop the animation; a timeline never starts its next phase
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Whether [`cancel`](Self::cancel) has been called
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Something the caller has to react to after a scheduler step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// An animation ran to its natural end
    Completed {
        /// Finished animation
        id: AnimationId,
        /// Its target
        target: ElementId,
    },
    /// A delayed call came due
    DelayedCall(DelayedCallId),
}

#[derive(Debug)]
struct Running {
    id: AnimationId,
    target: ElementId,
    phases: Vec<TweenSpec>,
    phase: usize,
    /// Time spent in the current phase, delay included
    local: TimePoint,
    /// Start values of the current phase, captured on first render
    start: Option<Props>,
    cancelled: Arc<AtomicBool>,
}

enum Step {
    Running,
    Completed,
    Cancelled,
}

impl Running {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    fn step(&mut self, scene: &mut Scene, dt: TimePoint) -> Step {
        let mut remaining = dt;
        loop {
            // Checked between phases as well as between frames
            if self.is_cancelled() {
                return Step::Cancelled;
            }

            let spec = &self.phases[self.phase];
            self.local += remaining;
            if self.local < spec.delay {
                return Step::Running;
            }

            let state = scene.state_mut(self.target);
            let start = match self.start {
                Some(start) => start,
                None => {
                    if let Some(from) = spec.from {
                        from.apply_to(state);
                    }
                    let captured = spec.to.capture(state);
                    self.start = Some(captured);
                    captured
                }
            };

            let elapsed = self.local - spec.delay;
            let (t, done) = spec.progress(elapsed);
            start.lerp(&spec.to, t).apply_to(state);
            if !done {
                return Step::Running;
            }

            remaining = spec
                .active_duration()
                .map_or(0.0, |total| (elapsed - total).max(0.0));
            self.phase += 1;
            self.local = 0.0;
            self.start = None;
            if self.phase == self.phases.len() {
                return Step::Completed;
            }
        }
    }
}

/// Global animation registry and clock
#[derive(Debug, Default)]
pub struct Scheduler {
    now: TimePoint,
    paused: bool,
    next_id: u64,
    running: Vec<Running>,
    delayed: Vec<(TimePoint, DelayedCallId)>,
}

impl Scheduler {
    /// Create an idle scheduler at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Current scheduler time in seconds
    pub fn now(&self) -> TimePoint {
        self.now
    }

    /// Whether time is frozen
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Freeze every animation and delayed call
    pub fn pause(&mut self) {
        if !self.paused {
            debug!("Scheduler paused at {:.3}s", self.now);
        }
        self.paused = true;
    }

    /// Continue from the frozen state
    pub fn resume(&mut self) {
        if self.paused {
            debug!("Scheduler resumed at {:.3}s", self.now);
        }
        self.paused = false;
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Set properties immediately, without a transition
    pub fn set(&mut self, scene: &mut Scene, target: ElementId, props: Props) {
        props.apply_to(scene.state_mut(target));
    }

    /// Start a single tween on `target`
    pub fn tween(&mut self, scene: &mut Scene, target: ElementId, spec: TweenSpec) -> AnimationHandle {
        self.timeline(scene, target, vec![spec])
    }

    /// Start an ordered chain of tweens on `target`.
    ///
    /// Each phase starts when the previous one completes. The first phase's
    /// `from` values are rendered immediately.
    pub fn timeline(
        &mut self,
        scene: &mut Scene,
        target: ElementId,
        phases: Vec<TweenSpec>,
    ) -> AnimationHandle {
        let handle = AnimationHandle {
            id: AnimationId(self.next_id()),
            target,
            cancelled: Arc::new(AtomicBool::new(false)),
        };

        let Some(first) = phases.first() else {
            return handle;
        };
        if let Some(from) = first.from {
            from.apply_to(scene.state_mut(target));
        }

        self.running.push(Running {
            id: handle.id,
            target,
            phases,
            phase: 0,
            local: 0.0,
            start: None,
            cancelled: Arc::clone(&handle.cancelled),
        });
        handle
    }

    /// Cancel every animation writing to `target`; returns how many were live
    pub fn kill_tweens_of(&mut self, target: ElementId) -> usize {
        let mut killed = 0;
        for anim in self.running.iter().filter(|a| a.target == target) {
            if !anim.is_cancelled() {
                anim.cancelled.store(true, Ordering::Relaxed);
                killed += 1;
            }
        }
        trace!("Killed {} animation(s) on {:?}", killed, target);
        killed
    }

    /// Cancel every animation and drop every pending delayed call;
    /// returns how many animations were live
    pub fn kill_all(&mut self) -> usize {
        let killed = self.active_count();
        for anim in &self.running {
            anim.cancelled.store(true, Ordering::Relaxed);
        }
        self.running.clear();
        self.delayed.clear();
        debug!("Killed all animations ({} live)", killed);
        killed
    }

    /// Fire a [`SchedulerEvent::DelayedCall`] after `delay` seconds of scheduler time
    pub fn delayed_call(&mut self, delay: TimePoint) -> DelayedCallId {
        let id = DelayedCallId(self.next_id());
        self.delayed.push((self.now + delay.max(0.0), id));
        id
    }

    /// Drop a pending delayed call; returns whether it was pending
    pub fn cancel_delayed_call(&mut self, id: DelayedCallId) -> bool {
        let before = self.delayed.len();
        self.delayed.retain(|&(_, pending)| pending != id);
        self.delayed.len() != before
    }

    /// Due time of the earliest pending delayed call
    pub fn next_due(&self) -> Option<TimePoint> {
        self.delayed
            .iter()
            .map(|&(due, _)| due)
            .min_by(|a, b| a.total_cmp(b))
    }

    /// Number of live (not cancelled) animations on `target`
    pub fn active_on(&self, target: ElementId) -> usize {
        self.running
            .iter()
            .filter(|a| a.target == target && !a.is_cancelled())
            .count()
    }

    /// Number of live animations
    pub fn active_count(&self) -> usize {
        self.running.iter().filter(|a| !a.is_cancelled()).count()
    }

    /// Advance towards `until`, stopping early at the next delayed call.
    ///
    /// Does nothing while paused.
    pub fn advance_to(&mut self, scene: &mut Scene, until: TimePoint) -> Vec<SchedulerEvent> {
        let mut events = Vec::new();
        if self.paused {
            return events;
        }

        let target = match self.next_due() {
            Some(due) if due < until => due.max(self.now),
            _ => until.max(self.now),
        };
        let dt = target - self.now;
        self.now = target;

        self.running.retain_mut(|anim| match anim.step(scene, dt) {
            Step::Running => true,
            Step::Cancelled => false,
            Step::Completed => {
                events.push(SchedulerEvent::Completed {
                    id: anim.id,
                    target: anim.target,
                });
                false
            }
        });

        let now = self.now;
        let mut fired: Vec<_> = self
            .delayed
            .iter()
            .copied()
            .filter(|&(due, _)| due <= now)
            .collect();
        fired.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        self.delayed.retain(|&(due, _)| due > now);
        events.extend(fired.into_iter().map(|(_, id)| SchedulerEvent::DelayedCall(id)));

        events
    }
}
