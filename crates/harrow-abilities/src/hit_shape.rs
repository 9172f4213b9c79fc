//! Hit shapes and the overlap query.
//!
//! Provides:
//! - Per-tick collision geometry (segment, polyline strip, circle)
//! - Circle overlap tests used by hosts without their own broad-phase
//! - Target eligibility filtering (layers, owner exclusion, already-hit)
//! - `query_overlaps`, which registers hits before returning them

use harrow_common::{distance_to_segment, EntityId, TargetLayer, Vec2};
use serde::{Deserialize, Serialize};

use crate::dedup::HitRegistry;
use crate::world::AbilityWorld;

/// Collision geometry for one tick. Rebuilt from scratch every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HitShape {
    /// Capsule around a segment (tether, slash sweep).
    Segment {
        /// Segment start.
        start: Vec2,
        /// Segment end.
        end: Vec2,
        /// Inflation radius.
        radius: f32,
    },
    /// Capsule strip along sampled points (whip).
    Polyline {
        /// Sample points, origin first.
        points: Vec<Vec2>,
        /// Inflation radius.
        radius: f32,
    },
    /// Filled circle (explosion).
    Circle {
        /// Center.
        center: Vec2,
        /// Radius.
        radius: f32,
    },
}

impl HitShape {
    /// Create a segment shape.
    #[must_use]
    pub fn segment(start: Vec2, end: Vec2, radius: f32) -> Self {
        Self::Segment {
            start,
            end,
            radius: radius.max(0.0),
        }
    }

    /// Create a polyline shape.
    #[must_use]
    pub fn polyline(points: Vec<Vec2>, radius: f32) -> Self {
        Self::Polyline {
            points,
            radius: radius.max(0.0),
        }
    }

    /// Create a circle shape.
    #[must_use]
    pub fn circle(center: Vec2, radius: f32) -> Self {
        Self::Circle {
            center,
            radius: radius.max(0.0),
        }
    }

    /// Distance from `point` to the shape's surface (0 inside).
    #[must_use]
    pub fn distance_to(&self, point: Vec2) -> f32 {
        let raw = match self {
            Self::Segment { start, end, radius } => {
                distance_to_segment(point, *start, *end) - radius
            },
            Self::Polyline { points, radius } => {
                let core = match points.as_slice() {
                    [] => f32::INFINITY,
                    [only] => point.distance(*only),
                    _ => points
                        .windows(2)
                        .map(|w| distance_to_segment(point, w[0], w[1]))
                        .fold(f32::INFINITY, f32::min),
                };
                core - radius
            },
            Self::Circle { center, radius } => point.distance(*center) - radius,
        };
        raw.max(0.0)
    }

    /// Whether a circle at `center` with `radius` touches the shape.
    #[must_use]
    pub fn overlaps_circle(&self, center: Vec2, radius: f32) -> bool {
        self.distance_to(center) <= radius.max(0.0)
    }

    /// Bounding circle for broad-phase culling.
    #[must_use]
    pub fn bounding_circle(&self) -> (Vec2, f32) {
        match self {
            Self::Segment { start, end, radius } => {
                let center = (*start + *end) * 0.5;
                (center, start.distance(*end) * 0.5 + radius)
            },
            Self::Polyline { points, radius } => {
                if points.is_empty() {
                    return (Vec2::ZERO, 0.0);
                }
                let (min, max) = points.iter().fold(
                    (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
                    |(lo, hi), p| (lo.min(*p), hi.max(*p)),
                );
                let center = (min + max) * 0.5;
                (center, (max - min).length() * 0.5 + radius)
            },
            Self::Circle { center, radius } => (*center, *radius),
        }
    }
}

/// Which targets an ability may affect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetFilter {
    /// Category bits a target must intersect.
    pub layers: TargetLayer::Flags,
    /// The casting entity.
    pub owner: Option<EntityId>,
    /// Allow the owner to be hit.
    pub include_owner: bool,
}

impl TargetFilter {
    /// Create a filter for `layers`, excluding `owner`.
    #[must_use]
    pub const fn new(layers: TargetLayer::Flags, owner: Option<EntityId>) -> Self {
        Self {
            layers,
            owner,
            include_owner: false,
        }
    }

    /// Let the owner be hit.
    #[must_use]
    pub const fn including_owner(mut self) -> Self {
        self.include_owner = true;
        self
    }

    /// Whether `entity` passes the owner and layer checks.
    #[must_use]
    pub fn allows<W: AbilityWorld + ?Sized>(&self, world: &W, entity: EntityId) -> bool {
        if !self.include_owner && self.owner == Some(entity) {
            return false;
        }
        if !world.is_valid(entity) {
            return false;
        }
        world
            .layers(entity)
            .is_some_and(|layers| TargetLayer::intersects(self.layers, layers))
    }
}

/// Find eligible targets overlapping `shape` that have not been hit yet.
///
/// Every returned target is already recorded in `registry`.
pub fn query_overlaps<W: AbilityWorld + ?Sized>(
    world: &W,
    shape: &HitShape,
    filter: &TargetFilter,
    registry: &mut HitRegistry,
) -> Vec<EntityId> {
    let mut struck = Vec::new();
    for entity in world.query_region(shape, filter.layers) {
        if registry.contains(entity) || !filter.allows(world, entity) {
            continue;
        }
        if registry.insert(entity) {
            struck.push(entity);
        }
    }
    struck
}
