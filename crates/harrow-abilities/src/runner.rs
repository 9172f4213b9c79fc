//! Ability runner.
//!
//! Owns every live instance and ticks them in creation order. Activation
//! is fire-and-forget: a successful call returns `Ok(())` and the instance
//! runs to completion on its own; a failed precondition returns the
//! diagnostic and leaves the world untouched.

use harrow_common::{AbilityResult, InstanceId};
use tracing::{debug, info, warn};

use crate::config::AbilityConfig;
use crate::events::{AbilityEvent, AbilityEventBus};
use crate::harvest::SharedThreshold;
use crate::instance::{AbilityInstance, AbilityKind, InstanceStatus};
use crate::params::{BindParams, ExplosionParams, HarvestParams, SlashParams, WhipParams};
use crate::world::AbilityWorld;

/// Drives every active ability.
#[derive(Debug)]
pub struct AbilityRunner {
    config: AbilityConfig,
    instances: Vec<AbilityInstance>,
    next_id: InstanceId,
    threshold: SharedThreshold,
    events: AbilityEventBus,
}

impl Default for AbilityRunner {
    fn default() -> Self {
        Self::new(AbilityConfig::default())
    }
}

impl AbilityRunner {
    /// Create a runner.
    #[must_use]
    pub fn new(mut config: AbilityConfig) -> Self {
        config.validate();
        let threshold = SharedThreshold::new(config.harvest.threshold);
        let events = AbilityEventBus::new(config.event_capacity);
        Self {
            config,
            instances: Vec::new(),
            next_id: InstanceId::new(1),
            threshold,
            events,
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &AbilityConfig {
        &self.config
    }

    /// Shared harvest threshold cell.
    #[must_use]
    pub const fn threshold(&self) -> &SharedThreshold {
        &self.threshold
    }

    // === Activation ===

    /// Tether `params.target` and hold it in place.
    pub fn activate_bind<W: AbilityWorld + ?Sized>(
        &mut self,
        world: &mut W,
        params: &BindParams,
    ) -> AbilityResult<()> {
        let created = AbilityInstance::bind(self.next_id, world, params, self.config.target_layers);
        self.admit(AbilityKind::Bind, created)
    }

    /// Lash a whip along the aim.
    pub fn activate_whip<W: AbilityWorld + ?Sized>(
        &mut self,
        world: &mut W,
        params: &WhipParams,
    ) -> AbilityResult<()> {
        let created = AbilityInstance::whip(self.next_id, world, params, self.config.target_layers);
        self.admit(AbilityKind::Whip, created)
    }

    /// Sweep a blade through an arc.
    pub fn activate_slash<W: AbilityWorld + ?Sized>(
        &mut self,
        world: &mut W,
        params: &SlashParams,
    ) -> AbilityResult<()> {
        let created = AbilityInstance::slash(self.next_id, world, params, self.config.target_layers);
        self.admit(AbilityKind::Slash, created)
    }

    /// Detonate a growing blast.
    pub fn activate_explosion<W: AbilityWorld + ?Sized>(
        &mut self,
        world: &mut W,
        params: &ExplosionParams,
    ) -> AbilityResult<()> {
        let created =
            AbilityInstance::explosion(self.next_id, world, params, self.config.target_layers);
        self.admit(AbilityKind::Explosion, created)
    }

    /// Mark low-health targets and execute them after the delay.
    pub fn activate_harvest<W: AbilityWorld + ?Sized>(
        &mut self,
        world: &mut W,
        params: &HarvestParams,
    ) -> AbilityResult<()> {
        let created = AbilityInstance::harvest(
            self.next_id,
            world,
            params,
            self.config.target_layers,
            &self.threshold,
        );
        self.admit(AbilityKind::Harvest, created)
    }

    fn admit(
        &mut self,
        kind: AbilityKind,
        created: AbilityResult<AbilityInstance>,
    ) -> AbilityResult<()> {
        let instance = match created {
            Ok(instance) => instance,
            Err(e) => {
                warn!("Rejected {} activation: {e}", kind.name());
                self.events.publish(AbilityEvent::Rejected {
                    kind,
                    reason: e.to_string(),
                });
                return Err(e);
            },
        };

        self.next_id = self.next_id.next();
        info!(
            "Activated {} {:?} for {:?}",
            kind.name(),
            instance.id(),
            instance.owner()
        );
        self.events.publish(AbilityEvent::Activated {
            instance: instance.id(),
            kind,
            owner: instance.owner(),
        });
        if let Some(batch) = instance.harvest_batch() {
            self.events.publish(AbilityEvent::HarvestMarked {
                instance: instance.id(),
                targets: batch.targets.iter().map(|c| c.entity).collect(),
                total_heal: batch.total_heal,
            });
        }
        self.instances.push(instance);
        Ok(())
    }

    // === Ticking ===

    /// Advance every instance by `dt` in creation order and dispose the
    /// finished ones.
    pub fn tick<W: AbilityWorld + ?Sized>(&mut self, dt: f32, world: &mut W) {
        for instance in &mut self.instances {
            if instance.advance(dt, world, &self.events) == InstanceStatus::Finished {
                instance.dispose(world, &self.events, false);
            }
        }
        self.instances.retain(|instance| !instance.is_disposed());
    }

    /// Cancel one instance. Returns `false` if it is not running.
    pub fn cancel<W: AbilityWorld + ?Sized>(&mut self, world: &mut W, id: InstanceId) -> bool {
        let Some(index) = self.instances.iter().position(|i| i.id() == id) else {
            return false;
        };
        let mut instance = self.instances.remove(index);
        instance.cancel(world, &self.events);
        true
    }

    /// Cancel everything, releasing locks and carriers.
    pub fn cancel_all<W: AbilityWorld + ?Sized>(&mut self, world: &mut W) {
        if !self.instances.is_empty() {
            debug!("Cancelling {} abilities", self.instances.len());
        }
        for mut instance in self.instances.drain(..) {
            instance.cancel(world, &self.events);
        }
    }

    // === Introspection ===

    /// Running instances.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.instances.len()
    }

    /// Whether nothing is running.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.instances.is_empty()
    }

    /// Running instances, in creation order.
    pub fn instances(&self) -> impl Iterator<Item = &AbilityInstance> {
        self.instances.iter()
    }

    /// Look up a running instance.
    #[must_use]
    pub fn instance(&self, id: InstanceId) -> Option<&AbilityInstance> {
        self.instances.iter().find(|i| i.id() == id)
    }

    /// Take pending events.
    pub fn drain_events(&self) -> Vec<AbilityEvent> {
        self.events.drain()
    }

    /// Event bus.
    #[must_use]
    pub const fn events(&self) -> &AbilityEventBus {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::{Arena, Body};
    use crate::config::{BindTuning, ExplosionTuning, HarvestTuning, WhipTuning};
    use crate::crowd_control::LockState;
    use crate::dedup::HitPolicy;
    use crate::effects::OnKill;
    use crate::params::Origin;
    use crate::timeline::Phase;
    use crate::world::Cue;
    use harrow_common::{AbilityError, EntityId, TargetLayer, Vec2};

    fn arena_with_player() -> (Arena, EntityId) {
        let mut arena = Arena::new();
        let player = arena.spawn_player(
            Body::new(Vec2::ZERO)
                .with_layers(TargetLayer::PLAYER)
                .with_health(200.0)
                .with_current_health(40.0)
                .with_meter(),
        );
        (arena, player)
    }

    fn enemy_at(arena: &mut Arena, position: Vec2, health: f32) -> EntityId {
        arena.spawn(Body::new(position).with_health(100.0).with_current_health(health))
    }

    fn near(a: f32, b: f32, tolerance: f32) -> bool {
        (a - b).abs() <= tolerance
    }

    /// Tick until idle, returning `(time, events)` pairs.
    fn run(runner: &mut AbilityRunner, arena: &mut Arena, dt: f32, limit: f32) -> Vec<(f32, AbilityEvent)> {
        let mut log = Vec::new();
        let mut t = 0.0;
        while !runner.is_idle() && t < limit {
            runner.tick(dt, arena);
            t += dt;
            log.extend(runner.drain_events().into_iter().map(|e| (t, e)));
        }
        log
    }

    #[test]
    fn test_bind_scenario() {
        let (mut arena, _) = arena_with_player();
        let target = arena.spawn(
            Body::new(Vec2::new(10.0, 0.0))
                .with_health(100.0)
                .with_motor()
                .with_rigid_body(1.0)
                .with_velocity(Vec2::new(0.0, 2.0)),
        );
        let mut runner = AbilityRunner::default();
        let tuning = BindTuning {
            extend: 0.2,
            hold: 1.0,
            bind: 2.0,
            retract: 0.25,
            damage: 0.0,
            ..BindTuning::default()
        };
        runner
            .activate_bind(&mut arena, &BindParams::from_tuning(Origin::player(), target, &tuning))
            .expect("activation");
        runner.drain_events();

        let dt = 0.01;
        let mut t = 0.0;
        let mut bound_at = None;
        let mut bound_count = 0;
        let mut released_at = None;
        let mut disposed_at = None;
        while t < 5.0 && disposed_at.is_none() {
            runner.tick(dt, &mut arena);
            t += dt;
            for event in runner.drain_events() {
                match event {
                    AbilityEvent::Bound { at, .. } => {
                        assert!(at.distance(Vec2::new(10.0, 0.0)) < 1e-4);
                        let body = arena.body(target).expect("target");
                        assert_eq!(body.velocity, Vec2::ZERO);
                        assert_eq!(body.autonomous, Some(false));
                        assert_eq!(body.kinematic, Some(true));
                        bound_at = Some(t);
                        bound_count += 1;
                    },
                    AbilityEvent::Released { early, .. } => {
                        assert!(!early);
                        let body = arena.body(target).expect("target");
                        assert_eq!(body.autonomous, Some(true));
                        assert_eq!(body.kinematic, Some(false));
                        released_at = Some(t);
                    },
                    AbilityEvent::Disposed { cancelled, .. } => {
                        assert!(!cancelled);
                        disposed_at = Some(t);
                    },
                    _ => {},
                }
            }
        }

        assert_eq!(bound_count, 1);
        assert!(near(bound_at.expect("bound"), 0.2, 0.015));
        assert!(near(released_at.expect("released"), 2.2, 0.03));
        assert!(near(disposed_at.expect("disposed"), 2.45, 0.04));
        assert_eq!(arena.live_visuals(), 0);
    }

    #[test]
    fn test_bind_target_lost_releases_early() {
        let (mut arena, _) = arena_with_player();
        let target = arena.spawn(Body::new(Vec2::new(4.0, 0.0)).with_motor());
        let mut runner = AbilityRunner::default();
        let params = BindParams::from_tuning(Origin::player(), target, &runner.config().bind);
        runner.activate_bind(&mut arena, &params).expect("activation");

        for _ in 0..30 {
            runner.tick(0.01, &mut arena);
        }
        let id = runner.instances().next().map(|i| i.id()).expect("running");
        assert!(matches!(
            runner.instance(id).and_then(|i| i.lock_state()),
            Some(LockState::Locked { .. })
        ));

        let last_seen = arena.body(target).map(|b| b.position).expect("target");
        arena.despawn(target);
        runner.tick(0.01, &mut arena);
        assert!(runner
            .drain_events()
            .iter()
            .any(|e| matches!(e, AbilityEvent::Released { early: true, .. })));

        // Tether stays drawn to where the target was.
        for _ in 0..20 {
            let instance = runner.instance(id).expect("running");
            assert_eq!(instance.phase(), Phase::Hold);
            let tip = instance.frame().map(|f| f.tip).expect("frame");
            assert!(tip.distance(last_seen) < 1e-4);
            runner.tick(0.01, &mut arena);
        }

        // Runs to completion on the cached position.
        run(&mut runner, &mut arena, 0.01, 5.0);
        assert!(runner.is_idle());
    }

    #[test]
    fn test_bind_missing_target_rejected() {
        let (mut arena, _) = arena_with_player();
        let mut runner = AbilityRunner::default();
        let ghost = EntityId::from_raw(u64::MAX);
        let params = BindParams::from_tuning(Origin::player(), ghost, &BindTuning::default());

        let result = runner.activate_bind(&mut arena, &params);
        assert!(matches!(result, Err(AbilityError::MissingTarget(id)) if id == ghost));
        assert!(runner.is_idle());
        assert_eq!(arena.live_visuals(), 0);
        assert!(matches!(
            runner.drain_events().as_slice(),
            [AbilityEvent::Rejected { kind: AbilityKind::Bind, .. }]
        ));
    }

    #[test]
    fn test_explosion_scenario() {
        let (mut arena, _) = arena_with_player();
        let inner = enemy_at(&mut arena, Vec2::new(2.9, 0.0), 100.0);
        let outer = enemy_at(&mut arena, Vec2::new(0.0, -3.5), 100.0);
        let mut runner = AbilityRunner::default();
        let tuning = ExplosionTuning {
            max_radius: 4.0,
            duration: 1.0,
            damage: 10.0,
            knockback: 0.0,
            ..ExplosionTuning::default()
        };
        runner
            .activate_explosion(&mut arena, &ExplosionParams::from_tuning(Origin::player(), None, &tuning))
            .expect("activation");

        for _ in 0..10 {
            runner.tick(0.05, &mut arena);
        }
        assert_eq!(arena.vitals(inner).map(|v| v.current), Some(90.0));
        assert_eq!(arena.vitals(outer).map(|v| v.current), Some(100.0));

        run(&mut runner, &mut arena, 0.05, 2.0);
        assert!(runner.is_idle());
        // Both hit exactly once.
        assert_eq!(arena.vitals(inner).map(|v| v.current), Some(90.0));
        assert_eq!(arena.vitals(outer).map(|v| v.current), Some(90.0));
    }

    #[test]
    fn test_per_frame_policy_rehits() {
        let (mut arena, _) = arena_with_player();
        let target = arena.spawn(Body::new(Vec2::new(1.0, 0.0)).with_health(1000.0));
        let mut runner = AbilityRunner::default();
        let tuning = ExplosionTuning {
            duration: 0.2,
            damage: 1.0,
            hit_policy: HitPolicy::OncePerFrame,
            ..ExplosionTuning::default()
        };
        runner
            .activate_explosion(&mut arena, &ExplosionParams::from_tuning(Origin::player(), None, &tuning))
            .expect("activation");

        let mut ticks = 0;
        while !runner.is_idle() {
            runner.tick(0.05, &mut arena);
            ticks += 1;
            let hits = runner
                .drain_events()
                .iter()
                .filter(|e| matches!(e, AbilityEvent::Hit { .. }))
                .count();
            assert_eq!(hits, 1);
        }
        let health = arena.vitals(target).map_or(0.0, |v| v.current);
        assert_eq!(health, 1000.0 - ticks as f32);
        assert!(ticks >= 4);
    }

    #[test]
    fn test_whip_hits_each_target_once() {
        let (mut arena, player) = arena_with_player();
        let target = arena.spawn(
            Body::new(Vec2::new(0.0, -2.5))
                .with_radius(1.0)
                .with_health(1000.0),
        );
        let mut runner = AbilityRunner::default();
        let tuning = WhipTuning {
            damage: 20.0,
            ..WhipTuning::default()
        };
        runner
            .activate_whip(&mut arena, &WhipParams::from_tuning(Origin::player(), Some(Vec2::X), &tuning))
            .expect("activation");

        let log = run(&mut runner, &mut arena, 0.01, 2.0);
        let hits: Vec<_> = log
            .iter()
            .filter_map(|(_, e)| match e {
                AbilityEvent::Hit { outcome, .. } => Some(outcome.target),
                _ => None,
            })
            .collect();
        assert_eq!(hits, vec![target]);
        assert_eq!(arena.vitals(target).map(|v| v.current), Some(980.0));
        assert_eq!(arena.vitals(player).map(|v| v.current), Some(40.0));
    }

    #[test]
    fn test_creation_order_on_shared_target() {
        let (mut arena, player) = arena_with_player();
        let target = enemy_at(&mut arena, Vec2::new(1.0, 0.0), 15.0);
        let mut runner = AbilityRunner::default();
        let tuning = ExplosionTuning {
            damage: 10.0,
            knockback: 0.0,
            on_kill: OnKill::harvest(0.5, 1),
            ..ExplosionTuning::default()
        };
        let params = ExplosionParams::from_tuning(Origin::player(), None, &tuning);
        runner.activate_explosion(&mut arena, &params).expect("first");
        runner.activate_explosion(&mut arena, &params).expect("second");
        runner.drain_events();

        runner.tick(0.3, &mut arena);
        let outcomes: Vec<_> = runner
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                AbilityEvent::Hit { outcome, .. } => Some(outcome),
                _ => None,
            })
            .collect();
        assert_eq!(outcomes.len(), 2);
        assert!(!outcomes[0].lethal);
        assert!(outcomes[1].lethal);
        assert_eq!(arena.vitals(target).map(|v| v.current), Some(0.0));
        // round(100 * 0.5) healed, one charge.
        assert_eq!(arena.vitals(player).map(|v| v.current), Some(90.0));
        assert_eq!(arena.body(player).and_then(|b| b.meter), Some(1));
    }

    #[test]
    fn test_harvest_scenario() {
        let (mut arena, player) = arena_with_player();
        let low = enemy_at(&mut arena, Vec2::new(2.0, 0.0), 15.0);
        let high = enemy_at(&mut arena, Vec2::new(-2.0, 0.0), 25.0);
        let mut runner = AbilityRunner::default();
        let tuning = HarvestTuning {
            heal_fraction: 0.5,
            delay: 0.3,
            ..HarvestTuning::default()
        };
        runner
            .activate_harvest(&mut arena, &HarvestParams::from_tuning(Origin::player(), &tuning))
            .expect("activation");

        let marked = runner.drain_events();
        assert!(marked.iter().any(|e| matches!(
            e,
            AbilityEvent::HarvestMarked { targets, total_heal, .. }
                if targets == &vec![low] && *total_heal == 50.0
        )));
        assert_eq!(arena.cues(), &[(low, Cue::HarvestMarked)]);

        let log = run(&mut runner, &mut arena, 0.05, 2.0);
        assert!(log
            .iter()
            .any(|(_, e)| matches!(e, AbilityEvent::Harvested { healed, .. } if *healed == 50.0)));
        assert!(!arena.is_valid(low));
        assert!(arena.is_valid(high));
        assert_eq!(arena.vitals(player).map(|v| v.current), Some(90.0));
        assert_eq!(arena.body(player).and_then(|b| b.meter), Some(1));
    }

    #[test]
    fn test_harvest_threshold_override_is_shared() {
        let (mut arena, _) = arena_with_player();
        let a = enemy_at(&mut arena, Vec2::new(2.0, 0.0), 15.0);
        let b = enemy_at(&mut arena, Vec2::new(-2.0, 0.0), 25.0);
        let mut runner = AbilityRunner::default();
        let params = HarvestParams::from_tuning(Origin::player(), &runner.config().harvest)
            .with_threshold(0.3);
        runner.activate_harvest(&mut arena, &params).expect("activation");
        assert_eq!(runner.threshold().get(), 0.3);

        let batch = runner
            .instances()
            .next()
            .and_then(|i| i.harvest_batch())
            .map(|batch| batch.targets.iter().map(|c| c.entity).collect::<Vec<_>>());
        assert_eq!(batch, Some(vec![a, b]));

        // Later activations read the overwritten value.
        let plain = HarvestParams::from_tuning(Origin::player(), &runner.config().harvest);
        runner.activate_harvest(&mut arena, &plain).expect("activation");
        assert_eq!(runner.threshold().get(), 0.3);
    }

    #[test]
    fn test_cancel_all_releases_lock() {
        let (mut arena, _) = arena_with_player();
        let target = arena.spawn(Body::new(Vec2::new(3.0, 0.0)).with_motor());
        let mut runner = AbilityRunner::default();
        let params = BindParams::from_tuning(Origin::player(), target, &BindTuning::default());
        runner.activate_bind(&mut arena, &params).expect("activation");
        let whip = WhipParams::from_tuning(Origin::player(), None, &WhipTuning::default());
        runner.activate_whip(&mut arena, &whip).expect("activation");
        assert_eq!(runner.active_count(), 2);

        for _ in 0..40 {
            runner.tick(0.01, &mut arena);
        }
        assert_eq!(arena.body(target).and_then(|b| b.autonomous), Some(false));

        runner.cancel_all(&mut arena);
        assert!(runner.is_idle());
        assert_eq!(arena.live_visuals(), 0);
        assert_eq!(arena.body(target).and_then(|b| b.autonomous), Some(true));
        let events = runner.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, AbilityEvent::Released { early: true, .. })));
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, AbilityEvent::Disposed { cancelled: true, .. }))
                .count(),
            2
        );
    }

    #[test]
    fn test_cancel_single() {
        let (mut arena, _) = arena_with_player();
        let mut runner = AbilityRunner::default();
        let whip = WhipParams::from_tuning(Origin::player(), None, &WhipTuning::default());
        runner.activate_whip(&mut arena, &whip).expect("activation");
        let id = runner.instances().next().map(|i| i.id()).expect("running");

        assert!(runner.cancel(&mut arena, id));
        assert!(!runner.cancel(&mut arena, id));
        assert!(runner.is_idle());
    }
}
