//! # Harrow Abilities
//!
//! Frame-stepped execution of melee and area abilities.
//!
//! This crate provides:
//! - Phase timelines and easing curves
//! - Motion generators for tether, whip, slash and explosion geometry
//! - Overlap queries with per-activation hit deduplication
//! - Effect resolution (damage, knockback, on-kill rewards)
//! - Crowd-control lock and harvest execution
//! - The ability runner that owns and ticks every instance
//!
//! The host world is reached only through [`world::AbilityWorld`];
//! [`arena::Arena`] is a complete in-memory implementation.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod arena;
pub mod config;
pub mod crowd_control;
pub mod dedup;
pub mod easing;
pub mod effects;
pub mod events;
pub mod harvest;
pub mod hit_shape;
pub mod instance;
pub mod motion;
pub mod params;
pub mod runner;
pub mod timeline;
pub mod tracked;
pub mod world;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::arena::{Arena, Body};
    pub use crate::config::{
        AbilityConfig, BindTuning, ExplosionTuning, HarvestTuning, SlashTuning, WhipTuning,
    };
    pub use crate::crowd_control::{BindLock, LockState};
    pub use crate::dedup::{HitPolicy, HitRegistry};
    pub use crate::easing::{ease_in, ease_out, Easing};
    pub use crate::effects::{resolve_hit, EffectOutcome, HitSpec, KnockbackRoute, OnKill};
    pub use crate::events::{AbilityEvent, AbilityEventBus};
    pub use crate::harvest::{HarvestBatch, HarvestReport, SharedThreshold};
    pub use crate::hit_shape::{query_overlaps, HitShape, TargetFilter};
    pub use crate::instance::{AbilityInstance, AbilityKind, InstanceStatus};
    pub use crate::motion::{MotionContext, MotionFrame, MotionGenerator};
    pub use crate::params::{
        BindParams, ExplosionParams, HarvestParams, Origin, SlashParams, WhipParams,
    };
    pub use crate::runner::AbilityRunner;
    pub use crate::timeline::{Phase, PhaseTimeline, TimelineTick};
    pub use crate::tracked::TrackedEntity;
    pub use crate::world::{AbilityWorld, Cue, KnockbackChannel, Vitals, VisualKind};
}
