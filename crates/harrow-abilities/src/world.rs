//! Host world interface.
//!
//! The engine never owns entities. Everything it needs from the
//! surrounding entity framework goes through [`AbilityWorld`]. Optional
//! capabilities have default implementations that report absence, so a
//! host only implements what its entities actually support.

use harrow_common::{EntityId, TargetLayer, Vec2, VisualId};
use serde::{Deserialize, Serialize};

use crate::hit_shape::HitShape;
use crate::motion::MotionFrame;

/// Health-style resource snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    /// Current value.
    pub current: f32,
    /// Maximum value.
    pub max: f32,
}

impl Vitals {
    /// Create a snapshot.
    #[must_use]
    pub const fn new(current: f32, max: f32) -> Self {
        Self { current, max }
    }

    /// Current as a fraction of max (0 when max is not positive).
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.max > 0.0 {
            self.current / self.max
        } else {
            0.0
        }
    }
}

/// How a target can be pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KnockbackChannel {
    /// Target handles knockback itself.
    Receiver,
    /// Target has a plain rigid body.
    RigidBody,
    /// Target cannot be pushed.
    #[default]
    None,
}

/// Kind of transient visual carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VisualKind {
    /// Bind tether line.
    Tether,
    /// Whip strip.
    Whip,
    /// Slash blade.
    Slash,
    /// Explosion ring.
    Explosion,
}

/// One-shot feedback cue on an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cue {
    /// Entity was collected by a harvest.
    HarvestMarked,
    /// Entity was executed by a harvest.
    HarvestExecuted,
}

/// Everything the engine consumes from the host.
pub trait AbilityWorld {
    // === Spatial ===

    /// Whether the handle still refers to a live entity.
    fn is_valid(&self, entity: EntityId) -> bool;

    /// World position.
    fn position(&self, entity: EntityId) -> Option<Vec2>;

    /// Configured facing direction.
    fn forward(&self, _entity: EntityId) -> Option<Vec2> {
        None
    }

    /// Collision radius.
    fn radius(&self, _entity: EntityId) -> f32 {
        0.0
    }

    /// Category bits.
    fn layers(&self, entity: EntityId) -> Option<TargetLayer::Flags>;

    /// Broad-phase: entities on `layers` overlapping `shape`.
    fn query_region(&self, shape: &HitShape, layers: TargetLayer::Flags) -> Vec<EntityId>;

    // === Lookup ===

    /// The designated player entity.
    fn player(&self) -> Option<EntityId>;

    /// World position of a named child transform.
    fn anchor(&self, _entity: EntityId, _name: &str) -> Option<Vec2> {
        None
    }

    // === Resources ===

    /// Health container.
    fn vitals(&self, _entity: EntityId) -> Option<Vitals> {
        None
    }

    /// Write current health. Returns `false` without a container.
    fn set_health(&mut self, _entity: EntityId, _value: f32) -> bool {
        false
    }

    /// Add to the harvest meter. Returns `false` without a meter.
    fn add_meter(&mut self, _entity: EntityId, _amount: u32) -> bool {
        false
    }

    /// Add shield. Returns `false` without a shield container.
    fn add_shield(&mut self, _entity: EntityId, _amount: f32) -> bool {
        false
    }

    /// Kill instantly.
    fn kill(&mut self, entity: EntityId) -> bool {
        self.set_health(entity, 0.0)
    }

    // === Motor ===

    /// Which knockback route the target supports.
    fn knockback_channel(&self, _entity: EntityId) -> KnockbackChannel {
        KnockbackChannel::None
    }

    /// Knockback through the target's own receiver.
    fn apply_knockback(&mut self, _entity: EntityId, _direction: Vec2, _magnitude: f32) {}

    /// Raw impulse on the target's rigid body.
    fn apply_impulse(&mut self, _entity: EntityId, _impulse: Vec2) {}

    /// Zero current velocity. Returns `false` without a body.
    fn reset_velocity(&mut self, _entity: EntityId) -> bool {
        false
    }

    /// Toggle autonomous movement. Returns `false` without a movement controller.
    fn set_autonomous_movement(&mut self, _entity: EntityId, _enabled: bool) -> bool {
        false
    }

    /// Kinematic flag of the rigid body.
    fn is_kinematic(&self, _entity: EntityId) -> Option<bool> {
        None
    }

    /// Set the kinematic flag. Returns `false` without a rigid body.
    fn set_kinematic(&mut self, _entity: EntityId, _kinematic: bool) -> bool {
        false
    }

    // === Visuals ===

    /// Spawn a visual carrier.
    fn spawn_visual(&mut self, kind: VisualKind, at: Vec2) -> Option<VisualId>;

    /// Push the latest motion frame to a carrier.
    fn update_visual(&mut self, _visual: VisualId, _frame: &MotionFrame) {}

    /// Destroy a carrier. Must tolerate already-destroyed carriers.
    fn despawn_visual(&mut self, _visual: VisualId) {}

    /// Play a feedback cue.
    fn cue(&mut self, _entity: EntityId, _cue: Cue) {}
}
