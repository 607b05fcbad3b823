//! Tween descriptors
//!
//! A [`TweenSpec`] describes one timed interpolation of a target's
//! properties. A timeline is an ordered list of specs played back to back
//! on the same target.

use crate::easing::Ease;
use crate::props::Props;
use serde::{Deserialize, Serialize};

/// Time in seconds
pub type TimePoint = f64;

/// How often a tween plays after its first run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Repeat {
    /// Play once, then `n` more times
    Count(u32),
    /// Play once
    #[default]
    Never,
    /// Repeat forever
    Forever,
}

/// Timed interpolation of a target's properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TweenSpec {
    /// Start values; applied as soon as the tween is created.
    /// When absent, the target's values are captured when the tween first renders.
    pub from: Option<Props>,
    /// End values
    pub to: Props,
    /// Length of one iteration in seconds
    pub duration: TimePoint,
    /// Wait before the first iteration
    pub delay: TimePoint,
    /// Easing curve
    pub ease: Ease,
    /// Extra iterations
    pub repeat: Repeat,
    /// Play odd iterations backwards
    pub yoyo: bool,
}

impl TweenSpec {
    /// Tween from the current values to `to`
    pub fn to(to: Props) -> Self {
        Self {
            from: None,
            to,
            duration: 0.5,
            delay: 0.0,
            ease: Ease::default(),
            repeat: Repeat::Never,
            yoyo: false,
        }
    }

    /// Tween from explicit start values to `to`
    pub fn from_to(from: Props, to: Props) -> Self {
        Self {
            from: Some(from),
            ..Self::to(to)
        }
    }

    /// Set the iteration duration
    pub fn duration(mut self, seconds: TimePoint) -> Self {
        self.duration = seconds;
        self
    }

    /// Set the start delay
    pub fn delay(mut self, seconds: TimePoint) -> Self {
        self.delay = seconds;
        self
    }

    /// Set the easing curve
    pub fn ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    /// Set the repeat mode
    pub fn repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    /// Play odd iterations backwards
    pub fn yoyo(mut self, yoyo: bool) -> Self {
        self.yoyo = yoyo;
        self
    }

    /// Shorthand for `repeat(Repeat::Forever)` with yoyo
    pub fn yoyo_forever(mut self) -> Self {
        self.repeat = Repeat::Forever;
        self.yoyo = true;
        self
    }

    /// Active time after the delay, or `None` when it never ends
    pub fn active_duration(&self) -> Option<TimePoint> {
        match self.repeat {
            Repeat::Never => Some(self.duration.max(0.0)),
            Repeat::Count(n) => Some(self.duration.max(0.0) * (n as f64 + 1.0)),
            Repeat::Forever => None,
        }
    }

    /// Eased progress after `elapsed` seconds of active time.
    ///
    /// Returns the progress and whether the tween has finished.
    pub(crate) fn progress(&self, elapsed: TimePoint) -> (f32, bool) {
        if self.duration <= 0.0 {
            return (self.ease.apply(self.final_linear()), self.active_duration().is_some());
        }

        if let Some(total) = self.active_duration() {
            if elapsed >= total {
                return (self.ease.apply(self.final_linear()), true);
            }
        }

        let cycles = elapsed / self.duration;
        let iteration = cycles.floor();
        let mut linear = (cycles - iteration) as f32;
        if self.yoyo && (iteration as u64) % 2 == 1 {
            linear = 1.0 - linear;
        }
        (self.ease.apply(linear), false)
    }

    /// Linear progress of the last iteration's end
    fn final_linear(&self) -> f32 {
        match self.repeat {
            Repeat::Count(n) if self.yoyo && n % 2 == 1 => 0.0,
            _ => 1.0,
        }
    }
}
