//! Easing curves shared by every motion generator.

use harrow_common::clamp01;
use serde::{Deserialize, Serialize};

/// Quadratic ease-in (slow start).
#[must_use]
pub fn ease_in(t: f32) -> f32 {
    let t = clamp01(t);
    t * t
}

/// Quadratic ease-out (slow end).
#[must_use]
pub fn ease_out(t: f32) -> f32 {
    let t = clamp01(t);
    1.0 - (1.0 - t) * (1.0 - t)
}

/// Easing function selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Easing {
    /// Linear interpolation.
    Linear,
    /// Ease in (slow start).
    EaseIn,
    /// Ease out (slow end).
    #[default]
    EaseOut,
    /// Ease in and out (slow start and end).
    EaseInOut,
}

impl Easing {
    /// Applies the easing function to a normalized time value.
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        let t = clamp01(t);
        match self {
            Self::Linear => t,
            Self::EaseIn => ease_in(t),
            Self::EaseOut => ease_out(t),
            Self::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            },
        }
    }
}
