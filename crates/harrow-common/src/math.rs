//! 2D math helpers shared by motion generators and hit shapes.
//!
//! Angles are radians, 0 = +X, counter-clockwise positive.

use std::f32::consts::{PI, TAU};

pub use glam::Vec2;

/// Vectors shorter than this are treated as having no direction.
pub const DEGENERATE_EPSILON: f32 = 1.0e-4;

/// Clamps a value into `[0, 1]`, mapping NaN to 0.
#[must_use]
pub fn clamp01(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Unit vector pointing at `angle`.
#[must_use]
pub fn from_angle(angle: f32) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(cos, sin)
}

/// Angle of a vector.
#[must_use]
pub fn angle_of(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}

/// Normalizes `v`, or returns the normalized `fallback` when `v` is degenerate.
///
/// A degenerate fallback yields +X.
#[must_use]
pub fn direction_or(v: Vec2, fallback: Vec2) -> Vec2 {
    let len = v.length();
    if len.is_finite() && len >= DEGENERATE_EPSILON {
        return v / len;
    }
    let len = fallback.length();
    if len.is_finite() && len >= DEGENERATE_EPSILON {
        fallback / len
    } else {
        Vec2::X
    }
}

/// Interpolates between two angles along the shortest arc.
///
/// Exactly opposite angles turn counter-clockwise.
#[must_use]
pub fn lerp_angle(from: f32, to: f32, t: f32) -> f32 {
    let mut delta = (to - from).rem_euclid(TAU);
    if delta > PI {
        delta -= TAU;
    }
    from + delta * clamp01(t)
}

/// Point on a quadratic Bezier curve.
#[must_use]
pub fn quadratic_bezier(p0: Vec2, p1: Vec2, p2: Vec2, t: f32) -> Vec2 {
    let u = 1.0 - t;
    p0 * (u * u) + p1 * (2.0 * u * t) + p2 * (t * t)
}

/// Distance from `point` to the segment `a`-`b`.
#[must_use]
pub fn distance_to_segment(point: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= DEGENERATE_EPSILON * DEGENERATE_EPSILON {
        return point.distance(a);
    }
    let t = ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    point.distance(a + ab * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_direction_or_fallback() {
        assert_eq!(direction_or(Vec2::new(3.0, 0.0), Vec2::Y), Vec2::X);
        assert_eq!(direction_or(Vec2::ZERO, Vec2::new(0.0, 2.0)), Vec2::Y);
        assert_eq!(direction_or(Vec2::ZERO, Vec2::ZERO), Vec2::X);
    }

    #[test]
    fn test_lerp_angle_wraps() {
        let a = 350.0_f32.to_radians();
        let b = 10.0_f32.to_radians();
        let mid = lerp_angle(a, b, 0.5);
        assert!((from_angle(mid) - Vec2::X).length() < 1e-4);
    }

    #[test]
    fn test_lerp_angle_half_turn_goes_counter_clockwise() {
        let mid = lerp_angle(PI, 0.0, 0.5);
        assert!((from_angle(mid) - Vec2::new(0.0, -1.0)).length() < 1e-4);
    }

    #[test]
    fn test_segment_distance() {
        let a = Vec2::ZERO;
        let b = Vec2::new(10.0, 0.0);
        assert!((distance_to_segment(Vec2::new(5.0, 3.0), a, b) - 3.0).abs() < 1e-5);
        assert!((distance_to_segment(Vec2::new(-4.0, 0.0), a, b) - 4.0).abs() < 1e-5);
        assert!((distance_to_segment(Vec2::new(1.0, 1.0), a, a) - 2.0_f32.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn test_bezier_endpoints() {
        let p0 = Vec2::ZERO;
        let p1 = Vec2::new(5.0, 5.0);
        let p2 = Vec2::new(10.0, 0.0);
        assert_eq!(quadratic_bezier(p0, p1, p2, 0.0), p0);
        assert_eq!(quadratic_bezier(p0, p1, p2, 1.0), p2);
        assert_eq!(quadratic_bezier(p0, p1, p2, 0.5), Vec2::new(5.0, 2.5));
    }

    proptest! {
        #[test]
        fn prop_clamp01_in_range(v in proptest::num::f32::ANY) {
            let c = clamp01(v);
            prop_assert!((0.0..=1.0).contains(&c));
        }

        #[test]
        fn prop_direction_is_unit(x in -100.0f32..100.0, y in -100.0f32..100.0) {
            let d = direction_or(Vec2::new(x, y), Vec2::X);
            prop_assert!((d.length() - 1.0).abs() < 1e-3);
        }
    }
}
