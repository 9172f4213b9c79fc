//! Slash: a blade point orbiting the caster through an arc.

use harrow_common::{angle_of, from_angle, Vec2};

use super::{MotionContext, MotionFrame, MotionGenerator};
use crate::easing::ease_out;
use crate::hit_shape::HitShape;
use crate::timeline::{Phase, TimelineTick};

/// Arc sweep around the caster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlashArc {
    /// Whole ability lifetime.
    pub duration: f32,
    /// Orbit radius.
    pub radius: f32,
    /// Arc start relative to the aim (radians).
    pub start_offset: f32,
    /// Swept angle (radians, signed).
    pub arc: f32,
    /// Blade thickness.
    pub hit_radius: f32,
    previous: Option<Vec2>,
}

impl SlashArc {
    /// Create an arc. Angles are given in degrees.
    #[must_use]
    pub fn new(duration: f32, radius: f32, start_offset_deg: f32, arc_deg: f32, hit_radius: f32) -> Self {
        Self {
            duration,
            radius,
            start_offset: start_offset_deg.to_radians(),
            arc: arc_deg.to_radians(),
            hit_radius,
            previous: None,
        }
    }

    /// Blade angle for a progress value, given the base (aim) angle.
    #[must_use]
    pub fn angle_at(&self, base_angle: f32, progress: f32) -> f32 {
        base_angle + self.start_offset + self.arc * ease_out(progress)
    }
}

impl MotionGenerator for SlashArc {
    fn phases(&self) -> Vec<(Phase, f32)> {
        vec![(Phase::Active, self.duration)]
    }

    fn frame(&mut self, tick: &TimelineTick, ctx: &MotionContext) -> MotionFrame {
        let angle = self.angle_at(angle_of(ctx.aim), tick.progress);
        let point = ctx.origin + from_angle(angle) * self.radius;
        // Sweep from last tick's point so fast arcs cannot skip a target.
        let start = self.previous.unwrap_or(point);
        self.previous = Some(point);
        MotionFrame {
            shape: HitShape::segment(start, point, self.hit_radius),
            origin: ctx.origin,
            tip: point,
            rotation: angle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::tick;

    fn ctx() -> MotionContext {
        MotionContext {
            origin: Vec2::ZERO,
            target: None,
            aim: Vec2::Y,
        }
    }

    #[test]
    fn test_arc_endpoints() {
        let mut slash = SlashArc::new(0.3, 2.0, -60.0, 120.0, 0.4);
        let start = slash.frame(&tick(Phase::Active, 0.0), &ctx());
        let expected = from_angle(30.0_f32.to_radians()) * 2.0;
        assert!((start.tip - expected).length() < 1e-4);

        let end = slash.frame(&tick(Phase::Active, 1.0), &ctx());
        let expected = from_angle(150.0_f32.to_radians()) * 2.0;
        assert!((end.tip - expected).length() < 1e-4);
    }

    #[test]
    fn test_sweep_segment_links_frames() {
        let mut slash = SlashArc::new(0.3, 2.0, -90.0, 180.0, 0.1);
        let first = slash.frame(&tick(Phase::Active, 0.0), &ctx());
        let second = slash.frame(&tick(Phase::Active, 1.0), &ctx());
        match second.shape {
            HitShape::Segment { start, end, .. } => {
                assert_eq!(start, first.tip);
                assert_eq!(end, second.tip);
            },
            other => panic!("expected segment, got {other:?}"),
        }
        // Half-turn chord crosses the caster.
        assert!(second.shape.overlaps_circle(Vec2::new(0.0, 0.0), 0.1));
    }
}
