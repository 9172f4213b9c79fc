//! In-memory reference world.
//!
//! A flat set of circular bodies with optional health, meter, shield,
//! motor and rigid body. Used by the demo binary and as the test double
//! for every engine module. Bodies iterate in spawn order.

use std::collections::BTreeMap;

use harrow_common::{EntityId, TargetLayer, Vec2, VisualId};
use tracing::{debug, trace};

use crate::hit_shape::HitShape;
use crate::motion::MotionFrame;
use crate::world::{AbilityWorld, Cue, KnockbackChannel, Vitals, VisualKind};

/// Velocity decay per second.
const DRAG: f32 = 4.0;

/// One entity in the arena.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    /// World position.
    pub position: Vec2,
    /// Collision radius.
    pub radius: f32,
    /// Category bits.
    pub layers: TargetLayer::Flags,
    /// Configured facing.
    pub forward: Option<Vec2>,
    /// Health container.
    pub health: Option<Vitals>,
    /// Harvest meter.
    pub meter: Option<u32>,
    /// Shield container.
    pub shield: Option<f32>,
    /// Current velocity.
    pub velocity: Vec2,
    /// Autonomous movement flag, if the body has a movement controller.
    pub autonomous: Option<bool>,
    /// Kinematic flag, if the body has a rigid body.
    pub kinematic: Option<bool>,
    /// Rigid-body mass.
    pub mass: f32,
    /// Handles knockback itself.
    pub knockback_receiver: bool,
    /// Named offsets from `position`.
    pub anchors: Vec<(String, Vec2)>,
}

impl Body {
    /// Bare enemy-layer point at `position`.
    #[must_use]
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            radius: 0.0,
            layers: TargetLayer::ENEMY,
            forward: None,
            health: None,
            meter: None,
            shield: None,
            velocity: Vec2::ZERO,
            autonomous: None,
            kinematic: None,
            mass: 1.0,
            knockback_receiver: false,
            anchors: Vec::new(),
        }
    }

    /// Set category bits.
    #[must_use]
    pub fn with_layers(mut self, layers: TargetLayer::Flags) -> Self {
        self.layers = layers;
        self
    }

    /// Set collision radius.
    #[must_use]
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius.max(0.0);
        self
    }

    /// Full health container of `max`.
    #[must_use]
    pub fn with_health(mut self, max: f32) -> Self {
        self.health = Some(Vitals::new(max, max));
        self
    }

    /// Set current health (adds a container of the same max if missing).
    #[must_use]
    pub fn with_current_health(mut self, current: f32) -> Self {
        let max = self.health.map_or(current, |v| v.max);
        self.health = Some(Vitals::new(current.min(max), max));
        self
    }

    /// Empty harvest meter.
    #[must_use]
    pub fn with_meter(mut self) -> Self {
        self.meter = Some(0);
        self
    }

    /// Shield container holding `amount`.
    #[must_use]
    pub fn with_shield(mut self, amount: f32) -> Self {
        self.shield = Some(amount);
        self
    }

    /// Movement controller, enabled.
    #[must_use]
    pub fn with_motor(mut self) -> Self {
        self.autonomous = Some(true);
        self
    }

    /// Dynamic rigid body of `mass`.
    #[must_use]
    pub fn with_rigid_body(mut self, mass: f32) -> Self {
        self.kinematic = Some(false);
        self.mass = mass.max(f32::EPSILON);
        self
    }

    /// Own knockback handling.
    #[must_use]
    pub fn with_knockback_receiver(mut self) -> Self {
        self.knockback_receiver = true;
        self
    }

    /// Named child offset.
    #[must_use]
    pub fn with_anchor(mut self, name: impl Into<String>, offset: Vec2) -> Self {
        self.anchors.push((name.into(), offset));
        self
    }

    /// Facing direction.
    #[must_use]
    pub fn with_forward(mut self, forward: Vec2) -> Self {
        self.forward = Some(forward);
        self
    }

    /// Initial velocity.
    #[must_use]
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    fn moves_on_its_own(&self) -> bool {
        self.autonomous != Some(false) && self.kinematic != Some(true)
    }
}

#[derive(Debug, Clone)]
struct Carrier {
    kind: VisualKind,
    frame: Option<MotionFrame>,
}

/// In-memory [`AbilityWorld`].
#[derive(Debug, Default)]
pub struct Arena {
    bodies: BTreeMap<EntityId, Body>,
    player: Option<EntityId>,
    visuals: BTreeMap<VisualId, Carrier>,
    next_visual: u64,
    refuse_visuals: bool,
    despawn_on_death: bool,
    cues: Vec<(EntityId, Cue)>,
    knockbacks: Vec<(EntityId, Vec2, f32)>,
    impulses: Vec<(EntityId, Vec2)>,
}

impl Arena {
    /// Empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a body.
    pub fn spawn(&mut self, body: Body) -> EntityId {
        let id = EntityId::new();
        trace!("Spawned {:?} at {:?}", id, body.position);
        self.bodies.insert(id, body);
        id
    }

    /// Add a body and make it the player.
    pub fn spawn_player(&mut self, body: Body) -> EntityId {
        let id = self.spawn(body);
        self.player = Some(id);
        id
    }

    /// Remove a body. Returns it if it existed.
    pub fn despawn(&mut self, entity: EntityId) -> Option<Body> {
        let body = self.bodies.remove(&entity);
        if body.is_some() {
            trace!("Despawned {:?}", entity);
        }
        body
    }

    /// Body lookup.
    #[must_use]
    pub fn body(&self, entity: EntityId) -> Option<&Body> {
        self.bodies.get(&entity)
    }

    /// Mutable body lookup.
    pub fn body_mut(&mut self, entity: EntityId) -> Option<&mut Body> {
        self.bodies.get_mut(&entity)
    }

    /// Live bodies, in spawn order.
    pub fn bodies(&self) -> impl Iterator<Item = (EntityId, &Body)> {
        self.bodies.iter().map(|(id, body)| (*id, body))
    }

    /// Number of live bodies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Whether the arena is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Integrate velocities.
    pub fn step(&mut self, dt: f32) {
        if !(dt.is_finite() && dt > 0.0) {
            return;
        }
        let decay = (-DRAG * dt).exp();
        for body in self.bodies.values_mut() {
            if body.moves_on_its_own() {
                body.position += body.velocity * dt;
            }
            body.velocity *= decay;
        }
    }

    /// Make `spawn_visual` fail.
    pub fn set_refuse_visuals(&mut self, refuse: bool) {
        self.refuse_visuals = refuse;
    }

    /// Remove bodies whose health is set to zero.
    pub fn set_despawn_on_death(&mut self, despawn: bool) {
        self.despawn_on_death = despawn;
    }

    /// Visual carriers alive.
    #[must_use]
    pub fn live_visuals(&self) -> usize {
        self.visuals.len()
    }

    /// Latest frame pushed to a carrier.
    #[must_use]
    pub fn visual_frame(&self, visual: VisualId) -> Option<&MotionFrame> {
        self.visuals.get(&visual).and_then(|c| c.frame.as_ref())
    }

    /// Kind of a live carrier.
    #[must_use]
    pub fn visual_kind(&self, visual: VisualId) -> Option<VisualKind> {
        self.visuals.get(&visual).map(|c| c.kind)
    }

    /// Cues played so far.
    #[must_use]
    pub fn cues(&self) -> &[(EntityId, Cue)] {
        &self.cues
    }

    /// Knockbacks delivered through receivers.
    #[must_use]
    pub fn knockback_log(&self) -> &[(EntityId, Vec2, f32)] {
        &self.knockbacks
    }

    /// Impulses applied to rigid bodies.
    #[must_use]
    pub fn impulse_log(&self) -> &[(EntityId, Vec2)] {
        &self.impulses
    }
}

impl AbilityWorld for Arena {
    fn is_valid(&self, entity: EntityId) -> bool {
        self.bodies.contains_key(&entity)
    }

    fn position(&self, entity: EntityId) -> Option<Vec2> {
        self.bodies.get(&entity).map(|b| b.position)
    }

    fn forward(&self, entity: EntityId) -> Option<Vec2> {
        self.bodies.get(&entity).and_then(|b| b.forward)
    }

    fn radius(&self, entity: EntityId) -> f32 {
        self.bodies.get(&entity).map_or(0.0, |b| b.radius)
    }

    fn layers(&self, entity: EntityId) -> Option<TargetLayer::Flags> {
        self.bodies.get(&entity).map(|b| b.layers)
    }

    fn query_region(&self, shape: &HitShape, layers: TargetLayer::Flags) -> Vec<EntityId> {
        let (center, reach) = shape.bounding_circle();
        self.bodies
            .iter()
            .filter(|(_, b)| TargetLayer::intersects(layers, b.layers))
            .filter(|(_, b)| b.position.distance(center) <= reach + b.radius)
            .filter(|(_, b)| shape.overlaps_circle(b.position, b.radius))
            .map(|(id, _)| *id)
            .collect()
    }

    fn player(&self) -> Option<EntityId> {
        self.player.filter(|id| self.bodies.contains_key(id))
    }

    fn anchor(&self, entity: EntityId, name: &str) -> Option<Vec2> {
        let body = self.bodies.get(&entity)?;
        body.anchors
            .iter()
            .find(|(anchor, _)| anchor == name)
            .map(|(_, offset)| body.position + *offset)
    }

    fn vitals(&self, entity: EntityId) -> Option<Vitals> {
        self.bodies.get(&entity).and_then(|b| b.health)
    }

    fn set_health(&mut self, entity: EntityId, value: f32) -> bool {
        let Some(health) = self.bodies.get_mut(&entity).and_then(|b| b.health.as_mut()) else {
            return false;
        };
        health.current = value.clamp(0.0, health.max);
        if self.despawn_on_death && health.current <= 0.0 {
            self.kill(entity);
        }
        true
    }

    fn add_meter(&mut self, entity: EntityId, amount: u32) -> bool {
        let Some(meter) = self.bodies.get_mut(&entity).and_then(|b| b.meter.as_mut()) else {
            return false;
        };
        *meter = meter.saturating_add(amount);
        true
    }

    fn add_shield(&mut self, entity: EntityId, amount: f32) -> bool {
        let Some(shield) = self.bodies.get_mut(&entity).and_then(|b| b.shield.as_mut()) else {
            return false;
        };
        *shield += amount;
        true
    }

    fn kill(&mut self, entity: EntityId) -> bool {
        let killed = self.bodies.remove(&entity).is_some();
        if killed {
            debug!("Killed {:?}", entity);
        }
        killed
    }

    fn knockback_channel(&self, entity: EntityId) -> KnockbackChannel {
        match self.bodies.get(&entity) {
            Some(b) if b.knockback_receiver => KnockbackChannel::Receiver,
            Some(b) if b.kinematic.is_some() => KnockbackChannel::RigidBody,
            _ => KnockbackChannel::None,
        }
    }

    fn apply_knockback(&mut self, entity: EntityId, direction: Vec2, magnitude: f32) {
        if let Some(body) = self.bodies.get_mut(&entity) {
            body.velocity += direction * magnitude;
            self.knockbacks.push((entity, direction, magnitude));
        }
    }

    fn apply_impulse(&mut self, entity: EntityId, impulse: Vec2) {
        if let Some(body) = self.bodies.get_mut(&entity) {
            if body.kinematic == Some(false) {
                body.velocity += impulse / body.mass;
            }
            self.impulses.push((entity, impulse));
        }
    }

    fn reset_velocity(&mut self, entity: EntityId) -> bool {
        match self.bodies.get_mut(&entity) {
            Some(body) => {
                body.velocity = Vec2::ZERO;
                true
            },
            None => false,
        }
    }

    fn set_autonomous_movement(&mut self, entity: EntityId, enabled: bool) -> bool {
        let Some(flag) = self.bodies.get_mut(&entity).and_then(|b| b.autonomous.as_mut()) else {
            return false;
        };
        *flag = enabled;
        true
    }

    fn is_kinematic(&self, entity: EntityId) -> Option<bool> {
        self.bodies.get(&entity).and_then(|b| b.kinematic)
    }

    fn set_kinematic(&mut self, entity: EntityId, kinematic: bool) -> bool {
        let Some(flag) = self.bodies.get_mut(&entity).and_then(|b| b.kinematic.as_mut()) else {
            return false;
        };
        *flag = kinematic;
        true
    }

    fn spawn_visual(&mut self, kind: VisualKind, at: Vec2) -> Option<VisualId> {
        if self.refuse_visuals {
            return None;
        }
        self.next_visual += 1;
        let id = VisualId::new(self.next_visual);
        trace!("Visual {:?} ({:?}) at {:?}", id, kind, at);
        self.visuals.insert(id, Carrier { kind, frame: None });
        Some(id)
    }

    fn update_visual(&mut self, visual: VisualId, frame: &MotionFrame) {
        if let Some(carrier) = self.visuals.get_mut(&visual) {
            carrier.frame = Some(frame.clone());
        }
    }

    fn despawn_visual(&mut self, visual: VisualId) {
        self.visuals.remove(&visual);
    }

    fn cue(&mut self, entity: EntityId, cue: Cue) {
        self.cues.push((entity, cue));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_respects_layers_and_radius() {
        let mut arena = Arena::new();
        let near = arena.spawn(Body::new(Vec2::new(3.2, 0.0)).with_radius(0.5));
        let point = arena.spawn(Body::new(Vec2::new(3.2, 0.0)));
        let friend = arena.spawn(Body::new(Vec2::new(1.0, 0.0)).with_layers(TargetLayer::PLAYER));

        let shape = HitShape::circle(Vec2::ZERO, 3.0);
        let hits = arena.query_region(&shape, TargetLayer::ENEMY);
        assert_eq!(hits, vec![near]);
        assert!(!hits.contains(&point));
        assert!(!hits.contains(&friend));
    }

    #[test]
    fn test_locked_body_does_not_drift() {
        let mut arena = Arena::new();
        let free = arena.spawn(Body::new(Vec2::ZERO).with_motor().with_velocity(Vec2::X));
        let held = arena.spawn(Body::new(Vec2::ZERO).with_motor().with_velocity(Vec2::X));
        arena.set_autonomous_movement(held, false);

        arena.step(0.5);
        assert!(arena.position(free).map_or(0.0, |p| p.x) > 0.0);
        assert_eq!(arena.position(held), Some(Vec2::ZERO));
    }

    #[test]
    fn test_kill_removes_and_player_lookup_follows() {
        let mut arena = Arena::new();
        let player = arena.spawn_player(Body::new(Vec2::ZERO));
        assert_eq!(arena.player(), Some(player));
        assert!(arena.kill(player));
        assert_eq!(arena.player(), None);
        assert!(!arena.kill(player));
    }

    #[test]
    fn test_visual_lifecycle() {
        let mut arena = Arena::new();
        let visual = arena.spawn_visual(VisualKind::Whip, Vec2::ZERO).expect("carrier");
        assert_eq!(arena.visual_kind(visual), Some(VisualKind::Whip));
        arena.despawn_visual(visual);
        arena.despawn_visual(visual);
        assert_eq!(arena.live_visuals(), 0);

        arena.set_refuse_visuals(true);
        assert!(arena.spawn_visual(VisualKind::Slash, Vec2::ZERO).is_none());
    }
}
