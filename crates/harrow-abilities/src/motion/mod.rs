//! Motion generators.
//!
//! Each generator maps timeline progress to the weapon's geometry for the
//! current tick:
//! - `tether`: two-point line from caster to a bound target
//! - `whip`: Bezier strip that lashes out, sweeps, and recoils
//! - `slash`: blade point orbiting the caster along an arc
//! - `explosion`: growing circle around a fixed point

pub mod explosion;
pub mod slash;
pub mod tether;
pub mod whip;

pub use explosion::ExplosionMotion;
pub use slash::SlashArc;
pub use tether::TetherMotion;
pub use whip::WhipMotion;

use harrow_common::Vec2;
use serde::{Deserialize, Serialize};

use crate::hit_shape::HitShape;
use crate::timeline::{Phase, TimelineTick};

/// Live inputs for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionContext {
    /// Caster origin (live or cached).
    pub origin: Vec2,
    /// Target position (live or cached), if the ability has one.
    pub target: Option<Vec2>,
    /// Unit aim direction.
    pub aim: Vec2,
}

/// Geometry and visual transform for one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionFrame {
    /// Collision geometry.
    pub shape: HitShape,
    /// Point knockback pushes away from.
    pub origin: Vec2,
    /// Leading point of the weapon.
    pub tip: Vec2,
    /// Visual rotation (radians).
    pub rotation: f32,
}

/// Produces per-tick geometry from phase and progress.
pub trait MotionGenerator {
    /// Phase layout this generator animates.
    fn phases(&self) -> Vec<(Phase, f32)>;

    /// Geometry for the given tick.
    fn frame(&mut self, tick: &TimelineTick, ctx: &MotionContext) -> MotionFrame;
}

/// Generators of abilities that strike whatever the geometry touches.
#[derive(Debug, Clone, PartialEq)]
pub enum StrikeMotion {
    /// Whip.
    Whip(WhipMotion),
    /// Slash arc.
    Slash(SlashArc),
    /// Explosion.
    Explosion(ExplosionMotion),
}

impl MotionGenerator for StrikeMotion {
    fn phases(&self) -> Vec<(Phase, f32)> {
        match self {
            Self::Whip(m) => m.phases(),
            Self::Slash(m) => m.phases(),
            Self::Explosion(m) => m.phases(),
        }
    }

    fn frame(&mut self, tick: &TimelineTick, ctx: &MotionContext) -> MotionFrame {
        match self {
            Self::Whip(m) => m.frame(tick, ctx),
            Self::Slash(m) => m.frame(tick, ctx),
            Self::Explosion(m) => m.frame(tick, ctx),
        }
    }
}

#[cfg(test)]
pub(crate) fn tick(phase: Phase, progress: f32) -> TimelineTick {
    TimelineTick {
        index: 0,
        phase,
        progress,
        phase_completed: progress >= 1.0,
        finished: false,
    }
}
