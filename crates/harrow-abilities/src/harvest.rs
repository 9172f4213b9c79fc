//! Harvest resolution: collect low-health targets, then execute them.
//!
//! The heal is fixed when targets are collected. Targets that disappear
//! during the delay are skipped at execution but still count toward it.

use std::sync::Arc;

use harrow_common::{clamp01, EntityId, Vec2};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dedup::{HitPolicy, HitRegistry};
use crate::effects::{heal_entity, kill_heal};
use crate::hit_shape::{query_overlaps, HitShape, TargetFilter};
use crate::world::{AbilityWorld, Cue};

/// Default health fraction at or below which targets are harvestable.
pub const DEFAULT_THRESHOLD: f32 = 0.2;

/// Harvest threshold shared by every harvest activation. Last write wins.
#[derive(Debug, Clone)]
pub struct SharedThreshold(Arc<RwLock<f32>>);

impl SharedThreshold {
    /// Create a cell holding `value` (clamped to [0, 1]).
    #[must_use]
    pub fn new(value: f32) -> Self {
        Self(Arc::new(RwLock::new(clamp01(value))))
    }

    /// Current threshold.
    #[must_use]
    pub fn get(&self) -> f32 {
        *self.0.read()
    }

    /// Overwrite the threshold.
    pub fn set(&self, value: f32) {
        let value = clamp01(value);
        *self.0.write() = value;
        debug!("Harvest threshold set to {}", value);
    }
}

impl Default for SharedThreshold {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

/// A collected target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HarvestCandidate {
    /// Target.
    pub entity: EntityId,
    /// Health fraction when collected.
    pub fraction: f32,
    /// Heal this target contributes.
    pub heal: f32,
}

/// Targets collected by one harvest, with the heal fixed at collection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HarvestBatch {
    /// Who receives the heal.
    pub invoker: Option<EntityId>,
    /// Collected targets, in query order.
    pub targets: Vec<HarvestCandidate>,
    /// Σ round(max_i × heal_fraction).
    pub total_heal: f32,
    /// Meter charge per executed target.
    pub charge_per_kill: u32,
}

impl HarvestBatch {
    /// Number of collected targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether nothing was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Outcome of executing a batch.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HarvestReport {
    /// Targets killed.
    pub executed: Vec<EntityId>,
    /// Targets gone before execution.
    pub skipped: Vec<EntityId>,
    /// Health the invoker actually gained (after clamping).
    pub healed: f32,
    /// Meter charge actually added.
    pub charge: u32,
}

/// Where and how to look for harvestable targets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarvestScan {
    /// Scan center.
    pub center: Vec2,
    /// Scan radius.
    pub range: f32,
    /// Health fraction at or below which a target is collected.
    pub threshold: f32,
    /// Fraction of each target's max health healed.
    pub heal_fraction: f32,
    /// Meter charge per executed target.
    pub charge_per_kill: u32,
}

/// Collect harvestable targets.
pub fn collect<W: AbilityWorld + ?Sized>(
    world: &W,
    invoker: Option<EntityId>,
    scan: &HarvestScan,
    filter: &TargetFilter,
) -> HarvestBatch {
    let shape = HitShape::circle(scan.center, scan.range);
    let mut registry = HitRegistry::new(HitPolicy::OncePerActivation);
    let threshold = scan.threshold;
    let mut batch = HarvestBatch {
        invoker,
        targets: Vec::new(),
        total_heal: 0.0,
        charge_per_kill: scan.charge_per_kill,
    };

    for entity in query_overlaps(world, &shape, filter, &mut registry) {
        let Some(vitals) = world.vitals(entity) else {
            continue;
        };
        let fraction = vitals.fraction();
        if fraction > threshold {
            continue;
        }
        let heal = kill_heal(vitals.max, scan.heal_fraction);
        batch.total_heal += heal;
        batch.targets.push(HarvestCandidate {
            entity,
            fraction,
            heal,
        });
    }

    debug!(
        "Harvest collected {} targets (threshold {}, heal {})",
        batch.len(),
        threshold,
        batch.total_heal
    );
    batch
}

/// Play the marked cue on every collected target.
pub fn mark<W: AbilityWorld + ?Sized>(world: &mut W, batch: &HarvestBatch) {
    for candidate in &batch.targets {
        if world.is_valid(candidate.entity) {
            world.cue(candidate.entity, Cue::HarvestMarked);
        }
    }
}

/// Kill every still-valid target and heal the invoker by the fixed total.
pub fn execute<W: AbilityWorld + ?Sized>(world: &mut W, batch: &HarvestBatch) -> HarvestReport {
    let mut report = HarvestReport::default();

    for candidate in &batch.targets {
        if !world.is_valid(candidate.entity) {
            report.skipped.push(candidate.entity);
            continue;
        }
        world.cue(candidate.entity, Cue::HarvestExecuted);
        world.kill(candidate.entity);
        report.executed.push(candidate.entity);
    }

    if let Some(invoker) = batch.invoker.filter(|id| world.is_valid(*id)) {
        report.healed = heal_entity(world, invoker, batch.total_heal);
        let kills = u32::try_from(report.executed.len()).unwrap_or(u32::MAX);
        let charge = batch.charge_per_kill.saturating_mul(kills);
        if charge > 0 && world.add_meter(invoker, charge) {
            report.charge = charge;
        }
    }

    info!(
        "Harvest executed {} (skipped {}), healed {}",
        report.executed.len(),
        report.skipped.len(),
        report.healed
    );
    report
}
