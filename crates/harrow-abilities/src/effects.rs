//! Effect resolution for a single hit.
//!
//! Order of operations per target:
//! 1. Snapshot vitals and predict lethality (`current <= damage`)
//! 2. Apply damage, clamped at zero
//! 3. On a lethal hit, pay the on-kill reward to the beneficiary
//! 4. Push the target away from the ability's origin
//!
//! Every step is skipped on its own when the target or beneficiary lacks
//! the capability it needs.

use harrow_common::{direction_or, EntityId, Vec2};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::world::{AbilityWorld, KnockbackChannel, Vitals};

/// On-kill reward configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OnKill {
    /// Master switch.
    pub enabled: bool,
    /// Fraction of the victim's max health given to the beneficiary.
    pub heal_fraction: f32,
    /// Meter charge per kill.
    pub harvest_charge: u32,
    /// Flat shield per kill.
    pub shield: f32,
}

impl OnKill {
    /// Rewards disabled.
    pub const NONE: Self = Self {
        enabled: false,
        heal_fraction: 0.0,
        harvest_charge: 0,
        shield: 0.0,
    };

    /// Heal-and-charge reward.
    #[must_use]
    pub const fn harvest(heal_fraction: f32, harvest_charge: u32) -> Self {
        Self {
            enabled: true,
            heal_fraction,
            harvest_charge,
            shield: 0.0,
        }
    }

    /// Add a flat shield to the reward.
    #[must_use]
    pub const fn with_shield(mut self, shield: f32) -> Self {
        self.shield = shield;
        self
    }
}

/// Heal granted for killing a target with `max_health`.
#[must_use]
pub fn kill_heal(max_health: f32, heal_fraction: f32) -> f32 {
    (max_health * heal_fraction).round().max(0.0)
}

/// Everything needed to resolve one hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitSpec {
    /// Raw damage.
    pub damage: f32,
    /// Knockback magnitude (0 disables).
    pub knockback: f32,
    /// Point knockback pushes away from.
    pub origin: Vec2,
    /// Direction used when target and origin coincide.
    pub fallback_direction: Vec2,
    /// Who receives on-kill rewards.
    pub beneficiary: Option<EntityId>,
    /// On-kill reward.
    pub on_kill: OnKill,
}

impl HitSpec {
    /// Damage-only hit.
    #[must_use]
    pub fn new(damage: f32) -> Self {
        Self {
            damage: damage.max(0.0),
            knockback: 0.0,
            origin: Vec2::ZERO,
            fallback_direction: Vec2::X,
            beneficiary: None,
            on_kill: OnKill::NONE,
        }
    }

    /// Set knockback magnitude and origin.
    #[must_use]
    pub fn with_knockback(mut self, magnitude: f32, origin: Vec2, fallback: Vec2) -> Self {
        self.knockback = magnitude.max(0.0);
        self.origin = origin;
        self.fallback_direction = fallback;
        self
    }

    /// Set the on-kill reward and who gets it.
    #[must_use]
    pub fn with_on_kill(mut self, beneficiary: Option<EntityId>, on_kill: OnKill) -> Self {
        self.beneficiary = beneficiary;
        self.on_kill = on_kill;
        self
    }
}

/// How knockback was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KnockbackRoute {
    /// Through the target's receiver.
    Receiver,
    /// As a rigid-body impulse.
    Impulse,
    /// Not applied.
    #[default]
    Skipped,
}

/// Reward paid for a lethal hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KillReward {
    /// Who was paid.
    pub beneficiary: EntityId,
    /// Health restored (after clamping).
    pub healed: f32,
    /// Meter charge added.
    pub charge: u32,
    /// Shield added.
    pub shield: f32,
}

/// Result of resolving one hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectOutcome {
    /// Target hit.
    pub target: EntityId,
    /// Health actually removed.
    pub damage_applied: f32,
    /// Health before the hit, if the target has a container.
    pub health_before: Option<f32>,
    /// Predicted before mutation: `health_before <= damage`.
    pub lethal: bool,
    /// Knockback vector (direction × magnitude), if applied.
    pub knockback: Option<Vec2>,
    /// Delivery route.
    pub knockback_route: KnockbackRoute,
    /// On-kill reward, if paid.
    pub reward: Option<KillReward>,
}

/// Resolve one hit against `target`.
pub fn resolve_hit<W: AbilityWorld + ?Sized>(
    world: &mut W,
    target: EntityId,
    spec: &HitSpec,
) -> EffectOutcome {
    let (snapshot, lethal, damage_applied) = apply_damage(world, target, spec.damage);
    let health_before = snapshot.map(|v| v.current);

    let reward = if lethal && spec.on_kill.enabled {
        // The victim may be gone after a lethal `set_health`.
        let victim_max = snapshot.map_or(0.0, |v| v.max);
        spec.beneficiary
            .map(|beneficiary| pay_kill_reward(world, beneficiary, victim_max, &spec.on_kill))
    } else {
        None
    };

    let (knockback, knockback_route) = apply_knockback(world, target, spec);

    let outcome = EffectOutcome {
        target,
        damage_applied,
        health_before,
        lethal,
        knockback,
        knockback_route,
        reward,
    };
    debug!(
        "Hit {:?}: {} damage, lethal={}, knockback={:?}",
        target, damage_applied, lethal, knockback_route
    );
    outcome
}

/// Apply damage. Returns `(vitals_before, lethal, applied)`.
fn apply_damage<W: AbilityWorld + ?Sized>(
    world: &mut W,
    target: EntityId,
    damage: f32,
) -> (Option<Vitals>, bool, f32) {
    let Some(vitals) = world.vitals(target) else {
        trace!("{:?} has no health container, damage skipped", target);
        return (None, false, 0.0);
    };
    let lethal = vitals.current <= damage;
    let after = (vitals.current - damage).max(0.0);
    if !world.set_health(target, after) {
        return (Some(vitals), lethal, 0.0);
    }
    (Some(vitals), lethal, vitals.current - after)
}

/// Pay heal, meter charge and shield to `beneficiary`.
pub fn pay_kill_reward<W: AbilityWorld + ?Sized>(
    world: &mut W,
    beneficiary: EntityId,
    victim_max: f32,
    on_kill: &OnKill,
) -> KillReward {
    let heal = kill_heal(victim_max, on_kill.heal_fraction);
    let healed = heal_entity(world, beneficiary, heal);
    let charge = if on_kill.harvest_charge > 0 && world.add_meter(beneficiary, on_kill.harvest_charge) {
        on_kill.harvest_charge
    } else {
        0
    };
    let shield = if on_kill.shield > 0.0 && world.add_shield(beneficiary, on_kill.shield) {
        on_kill.shield
    } else {
        0.0
    };
    KillReward {
        beneficiary,
        healed,
        charge,
        shield,
    }
}

/// Heal `entity` by `amount`, clamped to its max. Returns health restored.
pub fn heal_entity<W: AbilityWorld + ?Sized>(world: &mut W, entity: EntityId, amount: f32) -> f32 {
    if amount <= 0.0 {
        return 0.0;
    }
    let Some(vitals) = world.vitals(entity) else {
        return 0.0;
    };
    let after = (vitals.current + amount).min(vitals.max).max(vitals.current);
    if world.set_health(entity, after) {
        after - vitals.current
    } else {
        0.0
    }
}

fn apply_knockback<W: AbilityWorld + ?Sized>(
    world: &mut W,
    target: EntityId,
    spec: &HitSpec,
) -> (Option<Vec2>, KnockbackRoute) {
    if spec.knockback <= 0.0 {
        return (None, KnockbackRoute::Skipped);
    }
    let Some(position) = world.position(target) else {
        return (None, KnockbackRoute::Skipped);
    };
    let direction = direction_or(position - spec.origin, spec.fallback_direction);
    let force = direction * spec.knockback;

    match world.knockback_channel(target) {
        KnockbackChannel::Receiver => {
            world.apply_knockback(target, direction, spec.knockback);
            (Some(force), KnockbackRoute::Receiver)
        },
        KnockbackChannel::RigidBody => {
            world.apply_impulse(target, force);
            (Some(force), KnockbackRoute::Impulse)
        },
        KnockbackChannel::None => (None, KnockbackRoute::Skipped),
    }
}
