//! Activation parameters.
//!
//! Everything an instance needs is resolved into one of these before it
//! is created. Nothing here changes after activation.

use harrow_common::{EntityId, Vec2};

use crate::config::{BindTuning, ExplosionTuning, HarvestTuning, SlashTuning, WhipTuning};

/// Who casts the ability and where it is anchored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Origin {
    /// Caster. `None` resolves to the world's player.
    pub owner: Option<EntityId>,
    /// Named child transform used as the origin point.
    pub anchor: Option<String>,
}

impl Origin {
    /// Cast by the world's player.
    #[must_use]
    pub const fn player() -> Self {
        Self {
            owner: None,
            anchor: None,
        }
    }

    /// Cast by `owner`.
    #[must_use]
    pub const fn entity(owner: EntityId) -> Self {
        Self {
            owner: Some(owner),
            anchor: None,
        }
    }

    /// Use a named anchor on the owner.
    #[must_use]
    pub fn with_anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = Some(anchor.into());
        self
    }
}

/// Bind tether activation.
#[derive(Debug, Clone, PartialEq)]
pub struct BindParams {
    /// Caster.
    pub origin: Origin,
    /// Entity to tether.
    pub target: EntityId,
    /// Tuning.
    pub tuning: BindTuning,
}

impl BindParams {
    /// Build from tuning.
    #[must_use]
    pub fn from_tuning(origin: Origin, target: EntityId, tuning: &BindTuning) -> Self {
        Self {
            origin,
            target,
            tuning: tuning.clone(),
        }
    }

    /// Length of the attached phase.
    #[must_use]
    pub fn attached_duration(&self) -> f32 {
        self.tuning.hold.max(self.tuning.bind)
    }
}

/// Whip activation.
#[derive(Debug, Clone, PartialEq)]
pub struct WhipParams {
    /// Caster.
    pub origin: Origin,
    /// Aim direction. `None` uses the owner's forward.
    pub aim: Option<Vec2>,
    /// Tuning.
    pub tuning: WhipTuning,
}

impl WhipParams {
    /// Build from tuning.
    #[must_use]
    pub fn from_tuning(origin: Origin, aim: Option<Vec2>, tuning: &WhipTuning) -> Self {
        Self {
            origin,
            aim,
            tuning: tuning.clone(),
        }
    }
}

/// Slash activation.
#[derive(Debug, Clone, PartialEq)]
pub struct SlashParams {
    /// Caster.
    pub origin: Origin,
    /// Aim direction. `None` uses the owner's forward.
    pub aim: Option<Vec2>,
    /// Tuning.
    pub tuning: SlashTuning,
}

impl SlashParams {
    /// Build from tuning.
    #[must_use]
    pub fn from_tuning(origin: Origin, aim: Option<Vec2>, tuning: &SlashTuning) -> Self {
        Self {
            origin,
            aim,
            tuning: tuning.clone(),
        }
    }
}

/// Explosion activation.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplosionParams {
    /// Caster.
    pub origin: Origin,
    /// Blast center. `None` uses the origin position.
    pub center: Option<Vec2>,
    /// Tuning.
    pub tuning: ExplosionTuning,
}

impl ExplosionParams {
    /// Build from tuning.
    #[must_use]
    pub fn from_tuning(origin: Origin, center: Option<Vec2>, tuning: &ExplosionTuning) -> Self {
        Self {
            origin,
            center,
            tuning: tuning.clone(),
        }
    }
}

/// Harvest activation.
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestParams {
    /// Invoker.
    pub origin: Origin,
    /// Written to the shared threshold before scanning.
    pub threshold_override: Option<f32>,
    /// Tuning.
    pub tuning: HarvestTuning,
}

impl HarvestParams {
    /// Build from tuning.
    #[must_use]
    pub fn from_tuning(origin: Origin, tuning: &HarvestTuning) -> Self {
        Self {
            origin,
            threshold_override: None,
            tuning: tuning.clone(),
        }
    }

    /// Overwrite the shared threshold on activation.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold_override = Some(threshold);
        self
    }
}
