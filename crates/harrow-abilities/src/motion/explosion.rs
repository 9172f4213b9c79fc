//! Explosion: a circle growing from a fixed spawn point.

use harrow_common::Vec2;

use super::{MotionContext, MotionFrame, MotionGenerator};
use crate::easing::ease_out;
use crate::hit_shape::HitShape;
use crate::timeline::{Phase, TimelineTick};

/// Expanding blast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExplosionMotion {
    /// Expansion time.
    pub duration: f32,
    /// Final radius.
    pub max_radius: f32,
    /// Spawn point; never moves.
    pub center: Vec2,
}

impl ExplosionMotion {
    /// Create an explosion at `center`.
    #[must_use]
    pub fn new(center: Vec2, max_radius: f32, duration: f32) -> Self {
        Self {
            duration,
            max_radius: max_radius.max(0.0),
            center,
        }
    }

    /// Radius at a given progress.
    #[must_use]
    pub fn radius_at(&self, progress: f32) -> f32 {
        self.max_radius * ease_out(progress)
    }
}

impl MotionGenerator for ExplosionMotion {
    fn phases(&self) -> Vec<(Phase, f32)> {
        vec![(Phase::Active, self.duration)]
    }

    fn frame(&mut self, tick: &TimelineTick, _ctx: &MotionContext) -> MotionFrame {
        let radius = self.radius_at(tick.progress);
        MotionFrame {
            shape: HitShape::circle(self.center, radius),
            origin: self.center,
            tip: self.center,
            rotation: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::tick;

    #[test]
    fn test_radius_curve() {
        let explosion = ExplosionMotion::new(Vec2::ZERO, 4.0, 1.0);
        assert_eq!(explosion.radius_at(0.0), 0.0);
        assert!((explosion.radius_at(0.5) - 3.0).abs() < 1e-6);
        assert_eq!(explosion.radius_at(1.0), 4.0);
    }

    #[test]
    fn test_center_ignores_caster() {
        let mut explosion = ExplosionMotion::new(Vec2::new(5.0, 5.0), 4.0, 1.0);
        let ctx = MotionContext {
            origin: Vec2::new(-20.0, 0.0),
            target: None,
            aim: Vec2::X,
        };
        let frame = explosion.frame(&tick(Phase::Active, 0.5), &ctx);
        assert_eq!(frame.origin, Vec2::new(5.0, 5.0));
        assert!(frame.shape.overlaps_circle(Vec2::new(7.9, 5.0), 0.0));
    }
}
