//! Easing curves for tweens
//!
//! Curves are addressed by the short names used in show configs
//! (`"power1.out"`, `"sine.inOut"`, `"back.out(1.7)"`, ...).

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Default overshoot for `back` curves
pub const DEFAULT_BACK_OVERSHOOT: f32 = 1.70158;

/// Easing curve applied to tween progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Ease {
    /// Constant speed
    Linear,
    /// Quadratic, accelerating
    Power1In,
    /// Quadratic, decelerating
    #[default]
    Power1Out,
    /// Quadratic, accelerate then decelerate
    Power1InOut,
    /// Cubic, accelerating
    Power2In,
    /// Cubic, decelerating
    Power2Out,
    /// Cubic, accelerate then decelerate
    Power2InOut,
    /// Sine, accelerating
    SineIn,
    /// Sine, decelerating
    SineOut,
    /// Sine, accelerate then decelerate
    SineInOut,
    /// Overshoots the end value then settles (overshoot amount)
    BackOut(f32),
}

impl Ease {
    /// Map linear progress `t` in [0, 1] onto the curve.
    ///
    /// Input is clamped; endpoints are exact (`apply(0) == 0`, `apply(1) == 1`).
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        if t == 0.0 || t == 1.0 {
            return t;
        }
        match self {
            Ease::Linear => t,
            Ease::Power1In => t * t,
            Ease::Power1Out => 1.0 - (1.0 - t) * (1.0 - t),
            Ease::Power1InOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - 2.0 * (1.0 - t) * (1.0 - t)
                }
            }
            Ease::Power2In => t * t * t,
            Ease::Power2Out => 1.0 - (1.0 - t).powi(3),
            Ease::Power2InOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - 4.0 * (1.0 - t).powi(3)
                }
            }
            Ease::SineIn => 1.0 - (t * PI / 2.0).cos(),
            Ease::SineOut => (t * PI / 2.0).sin(),
            Ease::SineInOut => -((PI * t).cos() - 1.0) / 2.0,
            Ease::BackOut(s) => {
                let u = t - 1.0;
                1.0 + (s + 1.0) * u * u * u + s * u * u
            }
        }
    }
}

/// Error returned for an unknown easing name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown ease: {0}")]
pub struct UnknownEase(pub String);

impl FromStr for Ease {
    type Err = UnknownEase;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let ease = match name {
            "none" | "linear" => Ease::Linear,
            "power1.in" => Ease::Power1In,
            "power1.out" | "power1" => Ease::Power1Out,
            "power1.inOut" => Ease::Power1InOut,
            "power2.in" => Ease::Power2In,
            "power2.out" | "power2" => Ease::Power2Out,
            "power2.inOut" => Ease::Power2InOut,
            "sine.in" => Ease::SineIn,
            "sine.out" | "sine" => Ease::SineOut,
            "sine.inOut" => Ease::SineInOut,
            "back.out" | "back" => Ease::BackOut(DEFAULT_BACK_OVERSHOOT),
            _ => {
                let overshoot = name
                    .strip_prefix("back.out(")
                    .and_then(|rest| rest.strip_suffix(')'))
                    .and_then(|arg| arg.trim().parse::<f32>().ok())
                    .filter(|v| v.is_finite());
                match overshoot {
                    Some(s) => Ease::BackOut(s),
                    None => return Err(UnknownEase(name.to_string())),
                }
            }
        };
        Ok(ease)
    }
}

impl fmt::Display for Ease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ease::Linear => f.write_str("none"),
            Ease::Power1In => f.write_str("power1.in"),
            Ease::Power1Out => f.write_str("power1.out"),
            Ease::Power1InOut => f.write_str("power1.inOut"),
            Ease::Power2In => f.write_str("power2.in"),
            Ease::Power2Out => f.write_str("power2.out"),
            Ease::Power2InOut => f.write_str("power2.inOut"),
            Ease::SineIn => f.write_str("sine.in"),
            Ease::SineOut => f.write_str("sine.out"),
            Ease::SineInOut => f.write_str("sine.inOut"),
            Ease::BackOut(s) => write!(f, "back.out({})", s),
        }
    }
}

impl TryFrom<String> for Ease {
    type Error = UnknownEase;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Ease> for String {
    fn from(ease: Ease) -> Self {
        ease.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Ease; 11] = [
        Ease::Linear,
        Ease::Power1In,
        Ease::Power1Out,
        Ease::Power1InOut,
        Ease::Power2In,
        Ease::Power2Out,
        Ease::Power2InOut,
        Ease::SineIn,
        Ease::SineOut,
        Ease::SineInOut,
        Ease::BackOut(1.7),
    ];

    #[test]
    fn test_endpoints_are_exact() {
        for ease in ALL {
            assert_eq!(ease.apply(0.0), 0.0, "{ease} at 0");
            assert_eq!(ease.apply(1.0), 1.0, "{ease} at 1");
            assert_eq!(ease.apply(-3.0), 0.0);
            assert_eq!(ease.apply(7.0), 1.0);
        }
    }

    #[test]
    fn test_in_and_out_shapes() {
        // Ease-in lags behind linear, ease-out runs ahead
        assert!(Ease::Power1In.apply(0.25) < 0.25);
        assert!(Ease::Power1Out.apply(0.25) > 0.25);
        assert!((Ease::SineInOut.apply(0.5) - 0.5).abs() < 1e-6);
        assert!((Ease::Power2InOut.apply(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_back_out_overshoots() {
        let peak = (1..100)
            .map(|i| Ease::BackOut(1.7).apply(i as f32 / 100.0))
            .fold(0.0, f32::max);
        assert!(peak > 1.0);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("power1.out".parse::<Ease>().unwrap(), Ease::Power1Out);
        assert_eq!("sine.inOut".parse::<Ease>().unwrap(), Ease::SineInOut);
        assert_eq!("back.out(1.7)".parse::<Ease>().unwrap(), Ease::BackOut(1.7));
        assert_eq!(
            "back.out".parse::<Ease>().unwrap(),
            Ease::BackOut(DEFAULT_BACK_OVERSHOOT)
        );
        assert!("bounce.out".parse::<Ease>().is_err());
        assert!("back.out(abc)".parse::<Ease>().is_err());
    }

    #[test]
    fn test_default_is_power1_out() {
        assert_eq!(Ease::default(), Ease::Power1Out);
    }

    #[test]
    fn test_display_roundtrips_through_parse() {
        for ease in ALL {
            assert_eq!(ease.to_string().parse::<Ease>().unwrap(), ease);
        }
    }
}
