//! Ability instance lifecycle.
//!
//! An instance is created with fully resolved parameters, advanced once per
//! tick by the runner, and disposed when its timeline finishes or it is
//! cancelled. Disposal always releases a held lock and destroys the
//! visual carrier.

use harrow_common::{
    direction_or, AbilityError, AbilityResult, EntityId, InstanceId, TargetLayer, Vec2, VisualId,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::crowd_control::{BindLock, LockState};
use crate::dedup::{HitPolicy, HitRegistry};
use crate::effects::{resolve_hit, HitSpec, OnKill};
use crate::events::{AbilityEvent, AbilityEventBus};
use crate::harvest::{self, HarvestBatch, HarvestReport, HarvestScan, SharedThreshold};
use crate::hit_shape::{query_overlaps, TargetFilter};
use crate::motion::{
    whip, ExplosionMotion, MotionContext, MotionFrame, MotionGenerator, SlashArc, StrikeMotion,
    TetherMotion, WhipMotion,
};
use crate::params::{BindParams, ExplosionParams, HarvestParams, Origin, SlashParams, WhipParams};
use crate::timeline::{Phase, PhaseTimeline};
use crate::tracked::TrackedEntity;
use crate::world::{AbilityWorld, VisualKind};

/// Ability kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbilityKind {
    /// Bind tether.
    Bind,
    /// Whip.
    Whip,
    /// Slash arc.
    Slash,
    /// Explosion.
    Explosion,
    /// Harvest.
    Harvest,
}

impl AbilityKind {
    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bind => "bind",
            Self::Whip => "whip",
            Self::Slash => "slash",
            Self::Explosion => "explosion",
            Self::Harvest => "harvest",
        }
    }

    /// Visual carrier this kind needs, if any.
    #[must_use]
    pub const fn visual(self) -> Option<VisualKind> {
        match self {
            Self::Bind => Some(VisualKind::Tether),
            Self::Whip => Some(VisualKind::Whip),
            Self::Slash => Some(VisualKind::Slash),
            Self::Explosion => Some(VisualKind::Explosion),
            Self::Harvest => None,
        }
    }
}

/// Result of one `advance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceStatus {
    /// More ticks needed.
    Running,
    /// Timeline done; dispose now.
    Finished,
}

#[derive(Debug)]
enum Behavior {
    Bind {
        motion: TetherMotion,
        target: TrackedEntity,
        lock: BindLock,
        registry: HitRegistry,
    },
    Strike {
        motion: StrikeMotion,
        registry: HitRegistry,
    },
    Harvest {
        batch: HarvestBatch,
        report: Option<HarvestReport>,
    },
}

/// One running ability.
#[derive(Debug)]
pub struct AbilityInstance {
    id: InstanceId,
    kind: AbilityKind,
    owner: TrackedEntity,
    timeline: PhaseTimeline,
    aim: Vec2,
    hit: HitSpec,
    filter: TargetFilter,
    visual: Option<VisualId>,
    frame: Option<MotionFrame>,
    behavior: Behavior,
    age: f32,
    disposed: bool,
}

// ============================================================================
// Activation
// ============================================================================

fn resolve_owner<W: AbilityWorld + ?Sized>(world: &W, origin: &Origin) -> AbilityResult<TrackedEntity> {
    let owner = match origin.owner {
        Some(owner) => owner,
        None => world.player().ok_or(AbilityError::MissingOwner)?,
    };
    TrackedEntity::new(world, owner, origin.anchor.clone()).ok_or(AbilityError::InvalidOwner(owner))
}

/// Requested aim, else the owner's forward, else +X.
fn resolve_aim<W: AbilityWorld + ?Sized>(world: &W, owner: EntityId, aim: Option<Vec2>) -> Vec2 {
    let forward = world
        .forward(owner)
        .map_or(Vec2::X, |forward| direction_or(forward, Vec2::X));
    aim.map_or(forward, |aim| direction_or(aim, forward))
}

fn spawn_carrier<W: AbilityWorld + ?Sized>(
    world: &mut W,
    kind: AbilityKind,
    at: Vec2,
) -> AbilityResult<Option<VisualId>> {
    match kind.visual() {
        None => Ok(None),
        Some(visual) => world
            .spawn_visual(visual, at)
            .map(Some)
            .ok_or(AbilityError::VisualUnavailable(kind.name())),
    }
}

struct StrikeSetup {
    kind: AbilityKind,
    owner: TrackedEntity,
    aim: Vec2,
    motion: StrikeMotion,
    policy: HitPolicy,
    hit: HitSpec,
    visual_at: Vec2,
}

impl AbilityInstance {
    /// Create a bind tether. Fails if the owner, target or carrier is missing.
    pub fn bind<W: AbilityWorld + ?Sized>(
        id: InstanceId,
        world: &mut W,
        params: &BindParams,
        layers: TargetLayer::Flags,
    ) -> AbilityResult<Self> {
        let owner = resolve_owner(world, &params.origin)?;
        let target = TrackedEntity::new(world, params.target, None)
            .ok_or(AbilityError::MissingTarget(params.target))?;
        let facing = resolve_aim(world, owner.entity(), None);
        let aim = direction_or(target.position() - owner.position(), facing);
        let visual = spawn_carrier(world, AbilityKind::Bind, owner.position())?;

        let tuning = &params.tuning;
        let motion = TetherMotion::new(
            tuning.extend,
            params.attached_duration(),
            tuning.retract,
            tuning.width,
        );
        Ok(Self {
            id,
            kind: AbilityKind::Bind,
            timeline: PhaseTimeline::new(motion.phases()),
            aim,
            hit: HitSpec::new(tuning.damage).with_knockback(tuning.knockback, owner.position(), aim),
            filter: TargetFilter::new(layers, Some(owner.entity())),
            visual,
            frame: None,
            behavior: Behavior::Bind {
                motion,
                target,
                lock: BindLock::new(),
                registry: HitRegistry::new(HitPolicy::OncePerActivation),
            },
            owner,
            age: 0.0,
            disposed: false,
        })
    }

    /// Create a whip.
    pub fn whip<W: AbilityWorld + ?Sized>(
        id: InstanceId,
        world: &mut W,
        params: &WhipParams,
        layers: TargetLayer::Flags,
    ) -> AbilityResult<Self> {
        let owner = resolve_owner(world, &params.origin)?;
        let aim = resolve_aim(world, owner.entity(), params.aim);
        let tuning = &params.tuning;
        let motion = WhipMotion {
            extend: tuning.extend,
            swing: tuning.swing,
            retract: tuning.retract,
            max_length: tuning.max_length,
            curvature: tuning.curvature,
            slack: tuning.slack,
            segments: tuning.segments.clamp(1, whip::MAX_SEGMENTS),
            width: tuning.width,
        };
        let setup = StrikeSetup {
            kind: AbilityKind::Whip,
            visual_at: owner.position(),
            hit: strike_hit(tuning.damage, tuning.knockback, tuning.on_kill),
            motion: StrikeMotion::Whip(motion),
            policy: HitPolicy::OncePerActivation,
            owner,
            aim,
        };
        Self::strike(id, world, setup, layers)
    }

    /// Create a slash arc.
    pub fn slash<W: AbilityWorld + ?Sized>(
        id: InstanceId,
        world: &mut W,
        params: &SlashParams,
        layers: TargetLayer::Flags,
    ) -> AbilityResult<Self> {
        let owner = resolve_owner(world, &params.origin)?;
        let aim = resolve_aim(world, owner.entity(), params.aim);
        let tuning = &params.tuning;
        let motion = SlashArc::new(
            tuning.duration,
            tuning.radius,
            tuning.start_offset_deg,
            tuning.arc_deg,
            tuning.hit_radius,
        );
        let setup = StrikeSetup {
            kind: AbilityKind::Slash,
            visual_at: owner.position(),
            hit: strike_hit(tuning.damage, tuning.knockback, tuning.on_kill),
            motion: StrikeMotion::Slash(motion),
            policy: HitPolicy::OncePerActivation,
            owner,
            aim,
        };
        Self::strike(id, world, setup, layers)
    }

    /// Create an explosion. The center is fixed at activation.
    pub fn explosion<W: AbilityWorld + ?Sized>(
        id: InstanceId,
        world: &mut W,
        params: &ExplosionParams,
        layers: TargetLayer::Flags,
    ) -> AbilityResult<Self> {
        let owner = resolve_owner(world, &params.origin)?;
        let aim = resolve_aim(world, owner.entity(), None);
        let center = params.center.unwrap_or_else(|| owner.position());
        let tuning = &params.tuning;
        let setup = StrikeSetup {
            kind: AbilityKind::Explosion,
            visual_at: center,
            hit: strike_hit(tuning.damage, tuning.knockback, tuning.on_kill),
            motion: StrikeMotion::Explosion(ExplosionMotion::new(
                center,
                tuning.max_radius,
                tuning.duration,
            )),
            policy: tuning.hit_policy,
            owner,
            aim,
        };
        Self::strike(id, world, setup, layers)
    }

    fn strike<W: AbilityWorld + ?Sized>(
        id: InstanceId,
        world: &mut W,
        setup: StrikeSetup,
        layers: TargetLayer::Flags,
    ) -> AbilityResult<Self> {
        let visual = spawn_carrier(world, setup.kind, setup.visual_at)?;
        Ok(Self {
            id,
            kind: setup.kind,
            timeline: PhaseTimeline::new(setup.motion.phases()),
            aim: setup.aim,
            hit: setup.hit,
            filter: TargetFilter::new(layers, Some(setup.owner.entity())),
            visual,
            frame: None,
            behavior: Behavior::Strike {
                motion: setup.motion,
                registry: HitRegistry::new(setup.policy),
            },
            owner: setup.owner,
            age: 0.0,
            disposed: false,
        })
    }

    /// Create a harvest. Targets are collected and marked immediately; the
    /// batch executes when the delay elapses.
    pub fn harvest<W: AbilityWorld + ?Sized>(
        id: InstanceId,
        world: &mut W,
        params: &HarvestParams,
        layers: TargetLayer::Flags,
        threshold: &SharedThreshold,
    ) -> AbilityResult<Self> {
        let owner = resolve_owner(world, &params.origin)?;
        if let Some(value) = params.threshold_override {
            threshold.set(value);
        }

        let tuning = &params.tuning;
        let filter = TargetFilter::new(layers, Some(owner.entity()));
        let scan = HarvestScan {
            center: owner.position(),
            range: tuning.range,
            threshold: threshold.get(),
            heal_fraction: tuning.heal_fraction,
            charge_per_kill: tuning.charge_per_kill,
        };
        let batch = harvest::collect(world, Some(owner.entity()), &scan, &filter);
        harvest::mark(world, &batch);

        Ok(Self {
            id,
            kind: AbilityKind::Harvest,
            timeline: PhaseTimeline::single(Phase::Delay, tuning.delay),
            aim: resolve_aim(world, owner.entity(), None),
            hit: HitSpec::new(0.0),
            filter,
            visual: None,
            frame: None,
            behavior: Behavior::Harvest {
                batch,
                report: None,
            },
            owner,
            age: 0.0,
            disposed: false,
        })
    }
}

fn strike_hit(damage: f32, knockback: f32, on_kill: OnKill) -> HitSpec {
    HitSpec::new(damage)
        .with_knockback(knockback, Vec2::ZERO, Vec2::X)
        .with_on_kill(None, on_kill)
}

// ============================================================================
// Per-tick
// ============================================================================

impl AbilityInstance {
    /// Step by `dt` seconds.
    pub fn advance<W: AbilityWorld + ?Sized>(
        &mut self,
        dt: f32,
        world: &mut W,
        events: &AbilityEventBus,
    ) -> InstanceStatus {
        if self.disposed {
            return InstanceStatus::Finished;
        }

        let origin = self.owner.refresh(world);
        let tick = self.timeline.advance(dt);
        if dt.is_finite() && dt > 0.0 {
            self.age += dt;
        }
        trace!(
            "{} {:?} {} p={:.3}",
            self.kind.name(),
            self.id,
            tick.phase.name(),
            tick.progress
        );

        let beneficiary = self.owner.live_entity();
        let frame = match &mut self.behavior {
            Behavior::Bind {
                motion,
                target,
                lock,
                registry,
            } => {
                let target_position = target.refresh(world);
                let ctx = MotionContext {
                    origin,
                    target: Some(target_position),
                    aim: self.aim,
                };
                let frame = motion.frame(&tick, &ctx);

                if tick.phase == Phase::Extend && tick.phase_completed {
                    if let Some(entity) = target.live_entity() {
                        if self.filter.allows(&*world, entity) && registry.insert(entity) {
                            lock.acquire(world, entity);
                            events.publish(AbilityEvent::Bound {
                                instance: self.id,
                                target: entity,
                                at: frame.tip,
                            });
                            let spec = HitSpec {
                                origin,
                                ..self.hit
                            };
                            let outcome = resolve_hit(world, entity, &spec);
                            events.publish(AbilityEvent::Hit {
                                instance: self.id,
                                outcome,
                            });
                        }
                    }
                }

                if let LockState::Locked { .. } = lock.state() {
                    let early = !target.is_live() || !world.is_valid(target.entity());
                    let hold_done = tick.phase == Phase::Hold && tick.phase_completed;
                    if (early || hold_done) && lock.release(world) {
                        events.publish(AbilityEvent::Released {
                            instance: self.id,
                            target: target.entity(),
                            early,
                        });
                    }
                }
                Some(frame)
            },
            Behavior::Strike { motion, registry } => {
                registry.begin_frame();
                let ctx = MotionContext {
                    origin,
                    target: None,
                    aim: self.aim,
                };
                let frame = motion.frame(&tick, &ctx);
                let struck = query_overlaps(&*world, &frame.shape, &self.filter, registry);
                for entity in struck {
                    let spec = HitSpec {
                        origin: frame.origin,
                        fallback_direction: self.aim,
                        beneficiary,
                        ..self.hit
                    };
                    let outcome = resolve_hit(world, entity, &spec);
                    events.publish(AbilityEvent::Hit {
                        instance: self.id,
                        outcome,
                    });
                }
                Some(frame)
            },
            Behavior::Harvest { batch, report } => {
                if tick.finished && report.is_none() {
                    let done = harvest::execute(world, batch);
                    events.publish(AbilityEvent::Harvested {
                        instance: self.id,
                        executed: done.executed.clone(),
                        healed: done.healed,
                    });
                    *report = Some(done);
                }
                None
            },
        };

        if let (Some(visual), Some(frame)) = (self.visual, frame.as_ref()) {
            world.update_visual(visual, frame);
        }
        if frame.is_some() {
            self.frame = frame;
        }

        if tick.finished {
            InstanceStatus::Finished
        } else {
            InstanceStatus::Running
        }
    }

    /// Stop early. Releases any lock and destroys the carrier.
    pub fn cancel<W: AbilityWorld + ?Sized>(&mut self, world: &mut W, events: &AbilityEventBus) {
        self.dispose(world, events, true);
    }

    /// Release everything the instance holds. Safe to call more than once.
    pub fn dispose<W: AbilityWorld + ?Sized>(
        &mut self,
        world: &mut W,
        events: &AbilityEventBus,
        cancelled: bool,
    ) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        if let Behavior::Bind { lock, .. } = &mut self.behavior {
            if let Some(target) = lock.target() {
                if lock.release(world) {
                    events.publish(AbilityEvent::Released {
                        instance: self.id,
                        target,
                        early: true,
                    });
                }
            }
        }
        if let Some(visual) = self.visual.take() {
            world.despawn_visual(visual);
        }

        if cancelled {
            debug!("Cancelled {} {:?} at {:.3}s", self.kind.name(), self.id, self.age);
        } else {
            info!("{} {:?} finished after {:.3}s", self.kind.name(), self.id, self.age);
        }
        events.publish(AbilityEvent::Disposed {
            instance: self.id,
            kind: self.kind,
            cancelled,
        });
    }
}

// ============================================================================
// Accessors
// ============================================================================

impl AbilityInstance {
    /// Instance id.
    #[must_use]
    pub const fn id(&self) -> InstanceId {
        self.id
    }

    /// Ability kind.
    #[must_use]
    pub const fn kind(&self) -> AbilityKind {
        self.kind
    }

    /// Caster handle.
    #[must_use]
    pub const fn owner(&self) -> EntityId {
        self.owner.entity()
    }

    /// Aim direction fixed at activation.
    #[must_use]
    pub const fn aim(&self) -> Vec2 {
        self.aim
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.timeline.current_phase()
    }

    /// Seconds advanced so far.
    #[must_use]
    pub const fn age(&self) -> f32 {
        self.age
    }

    /// Timeline.
    #[must_use]
    pub const fn timeline(&self) -> &PhaseTimeline {
        &self.timeline
    }

    /// Last motion frame.
    #[must_use]
    pub const fn frame(&self) -> Option<&MotionFrame> {
        self.frame.as_ref()
    }

    /// Visual carrier, until disposal.
    #[must_use]
    pub const fn visual(&self) -> Option<VisualId> {
        self.visual
    }

    /// Whether `dispose` has run.
    #[must_use]
    pub const fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Targets hit over the activation.
    #[must_use]
    pub fn total_hits(&self) -> usize {
        match &self.behavior {
            Behavior::Bind { registry, .. } | Behavior::Strike { registry, .. } => {
                registry.total_hits()
            },
            Behavior::Harvest { report, .. } => report.as_ref().map_or(0, |r| r.executed.len()),
        }
    }

    /// Bind lock state.
    #[must_use]
    pub fn lock_state(&self) -> Option<LockState> {
        match &self.behavior {
            Behavior::Bind { lock, .. } => Some(lock.state()),
            _ => None,
        }
    }

    /// Harvest batch collected at activation.
    #[must_use]
    pub fn harvest_batch(&self) -> Option<&HarvestBatch> {
        match &self.behavior {
            Behavior::Harvest { batch, .. } => Some(batch),
            _ => None,
        }
    }

    /// Harvest report, once executed.
    #[must_use]
    pub fn harvest_report(&self) -> Option<&HarvestReport> {
        match &self.behavior {
            Behavior::Harvest { report, .. } => report.as_ref(),
            _ => None,
        }
    }
}
