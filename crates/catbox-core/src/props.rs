//! Animatable visual properties

use serde::{Deserialize, Serialize};

/// Full set of animatable properties of one scene element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisualState {
    /// Horizontal offset in illustration units
    pub x: f32,
    /// Vertical offset in illustration units
    pub y: f32,
    /// Opacity in [0, 1]
    pub opacity: f32,
    /// Uniform scale factor
    pub scale: f32,
    /// Rotation in degrees
    pub rotation: f32,
}

impl Default for VisualState {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            opacity: 1.0,
            scale: 1.0,
            rotation: 0.0,
        }
    }
}

/// Pivot for scale and rotation, as percentages of the element box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformOrigin {
    /// Horizontal pivot (percent)
    pub x: f32,
    /// Vertical pivot (percent)
    pub y: f32,
}

impl TransformOrigin {
    /// Create an origin from percentages
    pub const fn percent(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Default for TransformOrigin {
    fn default() -> Self {
        Self::percent(50.0, 50.0)
    }
}

/// A partial [`VisualState`]: the properties a tween or set touches.
///
/// Unset fields are left alone on the target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Props {
    /// Horizontal offset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    /// Vertical offset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    /// Opacity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
    /// Uniform scale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f32>,
    /// Rotation in degrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f32>,
}

impl Props {
    /// Empty property set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set x
    pub fn x(mut self, v: f32) -> Self {
        self.x = Some(v);
        self
    }

    /// Set y
    pub fn y(mut self, v: f32) -> Self {
        self.y = Some(v);
        self
    }

    /// Set both offsets
    pub fn position(self, x: f32, y: f32) -> Self {
        self.x(x).y(y)
    }

    /// Set opacity
    pub fn opacity(mut self, v: f32) -> Self {
        self.opacity = Some(v);
        self
    }

    /// Set scale
    pub fn scale(mut self, v: f32) -> Self {
        self.scale = Some(v);
        self
    }

    /// Set rotation
    pub fn rotation(mut self, v: f32) -> Self {
        self.rotation = Some(v);
        self
    }

    /// Whether no property is set
    pub fn is_empty(&self) -> bool {
        self.x.is_none()
            && self.y.is_none()
            && self.opacity.is_none()
            && self.scale.is_none()
            && self.rotation.is_none()
    }

    /// Write every set property onto `state`
    pub fn apply_to(&self, state: &mut VisualState) {
        if let Some(v) = self.x {
            state.x = v;
        }
        if let Some(v) = self.y {
            state.y = v;
        }
        if let Some(v) = self.opacity {
            state.opacity = v;
        }
        if let Some(v) = self.scale {
            state.scale = v;
        }
        if let Some(v) = self.rotation {
            state.rotation = v;
        }
    }

    /// Read the current values of the properties set in `self` from `state`
    pub fn capture(&self, state: &VisualState) -> Props {
        Props {
            x: self.x.map(|_| state.x),
            y: self.y.map(|_| state.y),
            opacity: self.opacity.map(|_| state.opacity),
            scale: self.scale.map(|_| state.scale),
            rotation: self.rotation.map(|_| state.rotation),
        }
    }

    /// Interpolate towards `to` at eased progress `t`.
    ///
    /// Only properties present in both sets are produced.
    pub fn lerp(&self, to: &Props, t: f32) -> Props {
        fn mix(a: Option<f32>, b: Option<f32>, t: f32) -> Option<f32> {
            match (a, b) {
                // Exact endpoints
                (Some(_), Some(b)) if t == 1.0 => Some(b),
                (Some(a), Some(b)) => Some(a + (b - a) * t),
                _ => None,
            }
        }
        Props {
            x: mix(self.x, to.x, t),
            y: mix(self.y, to.y, t),
            opacity: mix(self.opacity, to.opacity, t),
            scale: mix(self.scale, to.scale, t),
            rotation: mix(self.rotation, to.rotation, t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_only_touches_set_fields() {
        let mut state = VisualState {
            x: 3.0,
            ..Default::default()
        };
        Props::new().opacity(0.0).scale(0.6).apply_to(&mut state);
        assert_eq!(state.x, 3.0);
        assert_eq!(state.opacity, 0.0);
        assert_eq!(state.scale, 0.6);
        assert_eq!(state.rotation, 0.0);
    }

    #[test]
    fn test_capture_and_lerp() {
        let state = VisualState::default();
        let to = Props::new().opacity(0.0).rotation(10.0);
        let from = to.capture(&state);
        assert_eq!(from, Props::new().opacity(1.0).rotation(0.0));

        let mid = from.lerp(&to, 0.5);
        assert_eq!(mid.opacity, Some(0.5));
        assert_eq!(mid.rotation, Some(5.0));
        assert_eq!(mid.x, None);
    }
}
