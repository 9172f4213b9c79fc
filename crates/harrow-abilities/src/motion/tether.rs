//! Bind tether: a line from the caster to the bound target.

use harrow_common::{angle_of, direction_or, Vec2};

use super::{MotionContext, MotionFrame, MotionGenerator};
use crate::easing::{ease_in, ease_out};
use crate::hit_shape::HitShape;
use crate::timeline::{Phase, TimelineTick};

/// Tether timing and width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TetherMotion {
    /// Time for the tip to reach the target.
    pub extend: f32,
    /// Time the tether stays attached.
    pub hold: f32,
    /// Time for the tip to return.
    pub retract: f32,
    /// Line thickness.
    pub width: f32,
}

impl TetherMotion {
    /// Create a tether.
    #[must_use]
    pub const fn new(extend: f32, hold: f32, retract: f32, width: f32) -> Self {
        Self {
            extend,
            hold,
            retract,
            width,
        }
    }
}

impl MotionGenerator for TetherMotion {
    fn phases(&self) -> Vec<(Phase, f32)> {
        vec![
            (Phase::Extend, self.extend),
            (Phase::Hold, self.hold),
            (Phase::Retract, self.retract),
        ]
    }

    fn frame(&mut self, tick: &TimelineTick, ctx: &MotionContext) -> MotionFrame {
        let origin = ctx.origin;
        let target = ctx.target.unwrap_or(origin);
        let tip = match tick.phase {
            Phase::Extend => origin.lerp(target, ease_out(tick.progress)),
            Phase::Retract => target.lerp(origin, ease_in(tick.progress)),
            _ => target,
        };
        MotionFrame {
            shape: HitShape::segment(origin, tip, self.width * 0.5),
            origin,
            tip,
            rotation: angle_of(direction_or(tip - origin, ctx.aim)),
        }
    }
}
