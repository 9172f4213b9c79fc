//! Whip: a quadratic Bezier strip from the caster's hand to a moving tip.
//!
//! The tip first lashes out behind the caster, then sweeps half a turn to
//! the aim direction at full length, then recoils. During the sweep the
//! control point bends sideways (strongest mid-swing) and samples near the
//! hand trail toward it.

use std::f32::consts::PI;

use harrow_common::{angle_of, clamp01, from_angle, lerp_angle, quadratic_bezier, Vec2};

use super::{MotionContext, MotionFrame, MotionGenerator};
use crate::easing::{ease_in, ease_out};
use crate::hit_shape::HitShape;
use crate::timeline::{Phase, TimelineTick};

/// Most segments a strip is sampled with.
pub const MAX_SEGMENTS: usize = 64;

/// Whip shape and timing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhipMotion {
    /// Lash-out time.
    pub extend: f32,
    /// Sweep time.
    pub swing: f32,
    /// Recoil time.
    pub retract: f32,
    /// Full whip length.
    pub max_length: f32,
    /// Peak sideways bend, as a fraction of `max_length`.
    pub curvature: f32,
    /// How far samples near the hand trail during the sweep (0-1).
    pub slack: f32,
    /// Number of segments in the strip.
    pub segments: usize,
    /// Strip thickness.
    pub width: f32,
}

impl WhipMotion {
    /// Sideways bend weight for a sweep progress: 0 at the ends, 1 mid-swing.
    #[must_use]
    pub fn bend_weight(progress: f32) -> f32 {
        1.0 - (clamp01(progress) - 0.5).abs() * 2.0
    }

    /// Tip angle and length for a tick.
    #[must_use]
    pub fn tip_polar(&self, tick: &TimelineTick, aim_angle: f32) -> (f32, f32) {
        let behind = aim_angle + PI;
        match tick.phase {
            Phase::Extend => (behind, self.max_length * ease_out(tick.progress)),
            Phase::Swing => (lerp_angle(behind, aim_angle, tick.progress), self.max_length),
            Phase::Retract => (aim_angle, self.max_length * (1.0 - ease_in(tick.progress))),
            _ => (aim_angle, 0.0),
        }
    }
}

impl Default for WhipMotion {
    fn default() -> Self {
        Self {
            extend: 0.12,
            swing: 0.25,
            retract: 0.15,
            max_length: 4.0,
            curvature: 0.35,
            slack: 0.3,
            segments: 12,
            width: 0.3,
        }
    }
}

impl MotionGenerator for WhipMotion {
    fn phases(&self) -> Vec<(Phase, f32)> {
        vec![
            (Phase::Extend, self.extend),
            (Phase::Swing, self.swing),
            (Phase::Retract, self.retract),
        ]
    }

    fn frame(&mut self, tick: &TimelineTick, ctx: &MotionContext) -> MotionFrame {
        let origin = ctx.origin;
        let aim_angle = angle_of(ctx.aim);
        let (angle, length) = self.tip_polar(tick, aim_angle);
        let tip = origin + from_angle(angle) * length;

        let swinging = tick.phase == Phase::Swing;
        let bend = if swinging {
            Self::bend_weight(tick.progress)
        } else {
            0.0
        };
        let control = (origin + tip) * 0.5 + ctx.aim.perp() * (self.curvature * self.max_length * bend);

        let segments = self.segments.clamp(1, MAX_SEGMENTS);
        let slack = clamp01(self.slack);
        let points = (0..=segments)
            .map(|i| {
                let t = i as f32 / segments as f32;
                let point = quadratic_bezier(origin, control, tip, t);
                if swinging {
                    point.lerp(origin, slack * (1.0 - t))
                } else {
                    point
                }
            })
            .collect();

        MotionFrame {
            shape: HitShape::polyline(points, self.width * 0.5),
            origin,
            tip,
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
            aim: Vec2::X,
        }
    }

    fn points(frame: &MotionFrame) -> Vec<Vec2> {
        match &frame.shape {
            HitShape::Polyline { points, .. } => points.clone(),
            other => panic!("expected polyline, got {other:?}"),
        }
    }

    #[test]
    fn test_extend_goes_behind() {
        let mut whip = WhipMotion::default();
        let frame = whip.frame(&tick(Phase::Extend, 1.0), &ctx());
        assert!((frame.tip - Vec2::new(-4.0, 0.0)).length() < 1e-4);
        let pts = points(&frame);
        assert_eq!(pts.len(), 13);
        assert_eq!(pts[0], Vec2::ZERO);
    }

    #[test]
    fn test_swing_sweeps_half_turn_at_full_length() {
        let mut whip = WhipMotion::default();
        let mid = whip.frame(&tick(Phase::Swing, 0.5), &ctx());
        assert!((mid.tip.length() - 4.0).abs() < 1e-4);
        assert!((mid.tip - Vec2::new(0.0, -4.0)).length() < 1e-3);

        let end = whip.frame(&tick(Phase::Swing, 1.0), &ctx());
        assert!((end.tip - Vec2::new(4.0, 0.0)).length() < 1e-3);
    }

    #[test]
    fn test_bend_peaks_mid_swing() {
        assert_eq!(WhipMotion::bend_weight(0.0), 0.0);
        assert_eq!(WhipMotion::bend_weight(0.5), 1.0);
        assert_eq!(WhipMotion::bend_weight(1.0), 0.0);
        assert!((WhipMotion::bend_weight(0.25) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_swing_samples_trail_toward_hand() {
        let mut slack_whip = WhipMotion::default();
        let mut taut_whip = WhipMotion {
            slack: 0.0,
            ..WhipMotion::default()
        };
        let slack = points(&slack_whip.frame(&tick(Phase::Swing, 0.5), &ctx()));
        let taut = points(&taut_whip.frame(&tick(Phase::Swing, 0.5), &ctx()));

        // Tip untouched, inner samples pulled closer to the hand.
        assert_eq!(slack[12], taut[12]);
        assert!(slack[3].length() < taut[3].length());
    }

    #[test]
    fn test_retract_returns_to_hand() {
        let mut whip = WhipMotion::default();
        let frame = whip.frame(&tick(Phase::Retract, 1.0), &ctx());
        assert!(frame.tip.length() < 1e-5);
    }

    #[test]
    fn test_segment_count_is_bounded() {
        let mut huge = WhipMotion {
            segments: usize::MAX,
            ..WhipMotion::default()
        };
        let mut none = WhipMotion {
            segments: 0,
            ..WhipMotion::default()
        };
        assert_eq!(points(&huge.frame(&tick(Phase::Swing, 0.5), &ctx())).len(), MAX_SEGMENTS + 1);
        assert_eq!(points(&none.frame(&tick(Phase::Swing, 0.5), &ctx())).len(), 2);
    }
}
