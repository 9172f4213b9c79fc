//! Scripted arena run.

use glam::Vec2;
use harrow_abilities::prelude::*;
use harrow_common::{from_angle, AbilityResult, EntityId, TargetLayer};
use tracing::{debug, info, warn};

/// Seed used when none is given.
pub const DEFAULT_SEED: u64 = 0x00C0_FFEE;

/// Enemies scattered around the player.
const CROWD: usize = 14;

/// Hard stop for the run (seconds).
const TIME_LIMIT: f32 = 12.0;

/// Scripted activation.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Cast {
    Whip(Vec2),
    Slash(Vec2),
    BindNearest,
    Explosion(Vec2),
    Harvest,
}

/// Activation schedule (seconds, cast).
const SCRIPT: [(f32, Cast); 7] = [
    (0.0, Cast::Whip(Vec2::X)),
    (0.6, Cast::Slash(Vec2::NEG_Y)),
    (1.0, Cast::BindNearest),
    (1.4, Cast::Explosion(Vec2::new(3.0, 1.0))),
    (2.2, Cast::Whip(Vec2::NEG_X)),
    (3.5, Cast::Harvest),
    (4.5, Cast::Explosion(Vec2::new(-2.0, -2.0))),
];

/// What happened during a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimSummary {
    /// Simulated seconds.
    pub elapsed: f32,
    /// Successful activations.
    pub activations: usize,
    /// Rejected activations.
    pub rejections: usize,
    /// Targets struck.
    pub hits: usize,
    /// Lethal hits.
    pub kills: usize,
    /// Targets executed by harvests.
    pub harvested: usize,
    /// Player health at the end.
    pub player_health: f32,
    /// Player meter at the end.
    pub player_meter: u32,
}

fn populate(arena: &mut Arena, seed: u64) -> EntityId {
    let player = arena.spawn_player(
        Body::new(Vec2::ZERO)
            .with_layers(TargetLayer::PLAYER)
            .with_radius(0.4)
            .with_health(100.0)
            .with_current_health(55.0)
            .with_meter()
            .with_shield(0.0)
            .with_anchor("hand", Vec2::new(0.35, 0.1))
            .with_forward(Vec2::X),
    );

    let mut rng = fastrand::Rng::with_seed(seed);
    for _ in 0..CROWD {
        let angle = rng.f32() * std::f32::consts::TAU;
        let distance = 1.5 + rng.f32() * 4.5;
        let max = 40.0 + (rng.u32(0..5) * 20) as f32;
        let current = max * (0.1 + rng.f32() * 0.9);
        let mut body = Body::new(from_angle(angle) * distance)
            .with_layers(if rng.u8(0..6) == 0 {
                TargetLayer::DESTRUCTIBLE
            } else {
                TargetLayer::ENEMY
            })
            .with_radius(0.3 + rng.f32() * 0.3)
            .with_health(max)
            .with_current_health(current)
            .with_motor();
        body = match rng.u8(0..3) {
            0 => body.with_knockback_receiver(),
            1 => body.with_rigid_body(0.5 + rng.f32() * 2.0),
            _ => body,
        };
        arena.spawn(body);
    }
    // Bystander the abilities must never touch.
    arena.spawn(
        Body::new(Vec2::new(0.0, 2.0))
            .with_layers(TargetLayer::NEUTRAL)
            .with_radius(0.5)
            .with_health(10.0),
    );
    player
}

fn nearest_enemy(arena: &Arena, from: Vec2) -> Option<EntityId> {
    arena
        .bodies()
        .filter(|(_, body)| TargetLayer::intersects(TargetLayer::ENEMY, body.layers))
        .min_by(|(_, a), (_, b)| {
            a.position
                .distance_squared(from)
                .total_cmp(&b.position.distance_squared(from))
        })
        .map(|(id, _)| id)
}

fn cast(runner: &mut AbilityRunner, arena: &mut Arena, next: Cast) -> AbilityResult<()> {
    let config = runner.config().clone();
    let origin = Origin::player().with_anchor("hand");
    match next {
        Cast::Whip(aim) => {
            runner.activate_whip(arena, &WhipParams::from_tuning(origin, Some(aim), &config.whip))
        },
        Cast::Slash(aim) => {
            runner.activate_slash(arena, &SlashParams::from_tuning(origin, Some(aim), &config.slash))
        },
        Cast::BindNearest => {
            let from = arena.player().and_then(|p| arena.position(p)).unwrap_or(Vec2::ZERO);
            let target = nearest_enemy(arena, from).unwrap_or(EntityId::NULL);
            runner.activate_bind(arena, &BindParams::from_tuning(origin, target, &config.bind))
        },
        Cast::Explosion(center) => runner.activate_explosion(
            arena,
            &ExplosionParams::from_tuning(origin, Some(center), &config.explosion),
        ),
        Cast::Harvest => {
            runner.activate_harvest(arena, &HarvestParams::from_tuning(origin, &config.harvest))
        },
    }
}

/// Run the script to completion.
pub fn simulate(config: &AbilityConfig, seed: u64) -> SimSummary {
    let mut arena = Arena::new();
    let player = populate(&mut arena, seed);
    let mut runner = AbilityRunner::new(config.clone());
    let dt = runner.config().tick_dt();
    info!("Arena seeded with {} bodies (seed {seed:#x}), dt {dt:.4}", arena.len());

    let mut summary = SimSummary::default();
    let mut script = SCRIPT.iter().peekable();
    let mut t = 0.0_f32;

    while t < TIME_LIMIT {
        while let Some((_, next)) = script.next_if(|(at, _)| *at <= t) {
            if let Err(e) = cast(&mut runner, &mut arena, *next) {
                warn!("{next:?} failed: {e}");
            }
        }

        runner.tick(dt, &mut arena);
        arena.step(dt);
        t += dt;

        for event in runner.drain_events() {
            record(&mut summary, &event);
        }
        if script.peek().is_none() && runner.is_idle() {
            break;
        }
    }

    summary.elapsed = t;
    summary.player_health = arena.vitals(player).map_or(0.0, |v| v.current);
    summary.player_meter = arena.body(player).and_then(|b| b.meter).unwrap_or(0);
    summary
}

fn record(summary: &mut SimSummary, event: &AbilityEvent) {
    match event {
        AbilityEvent::Activated { .. } => summary.activations += 1,
        AbilityEvent::Rejected { kind, reason } => {
            summary.rejections += 1;
            debug!("{} rejected: {reason}", kind.name());
        },
        AbilityEvent::Hit { outcome, .. } => {
            summary.hits += 1;
            if outcome.lethal {
                summary.kills += 1;
                info!("{:?} killed", outcome.target);
            }
        },
        AbilityEvent::Bound { target, at, .. } => info!("Bound {target:?} at {at:?}"),
        AbilityEvent::Released { target, early, .. } => {
            info!("Released {target:?}{}", if *early { " early" } else { "" });
        },
        AbilityEvent::HarvestMarked { targets, total_heal, .. } => {
            info!("Harvest marked {} targets for {total_heal} heal", targets.len());
        },
        AbilityEvent::Harvested { executed, healed, .. } => {
            summary.harvested += executed.len();
            info!("Harvest executed {} for {healed} heal", executed.len());
        },
        AbilityEvent::Disposed { .. } => {},
    }
}
