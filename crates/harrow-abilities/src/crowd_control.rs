//! Crowd-control lock used by the bind tether.

use harrow_common::EntityId;
use tracing::debug;

use crate::world::AbilityWorld;

/// Lock state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockState {
    /// Target moves freely.
    #[default]
    Free,
    /// Target is held in place.
    Locked {
        /// Kinematic flag to restore, if the target had a rigid body.
        restore_kinematic: Option<bool>,
    },
}

/// Immobilises one target at most once and restores it on release.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BindLock {
    state: LockState,
    target: Option<EntityId>,
    acquired: bool,
}

impl BindLock {
    /// New, unlocked.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock `target`. Returns `false` if this lock was already used or the
    /// target is gone.
    pub fn acquire<W: AbilityWorld + ?Sized>(&mut self, world: &mut W, target: EntityId) -> bool {
        if self.acquired || !world.is_valid(target) {
            return false;
        }
        self.acquired = true;

        world.reset_velocity(target);
        world.set_autonomous_movement(target, false);
        let restore_kinematic = world.is_kinematic(target);
        if restore_kinematic.is_some() {
            world.set_kinematic(target, true);
        }

        self.state = LockState::Locked { restore_kinematic };
        self.target = Some(target);
        debug!("Bound {:?}", target);
        true
    }

    /// Release the target. Safe to call repeatedly and on vanished targets.
    /// Returns `true` only on the call that actually released.
    pub fn release<W: AbilityWorld + ?Sized>(&mut self, world: &mut W) -> bool {
        let LockState::Locked { restore_kinematic } = self.state else {
            return false;
        };
        self.state = LockState::Free;
        let Some(target) = self.target.take() else {
            return false;
        };

        if world.is_valid(target) {
            world.set_autonomous_movement(target, true);
            if let Some(previous) = restore_kinematic {
                world.set_kinematic(target, previous);
            }
            debug!("Released {:?}", target);
        } else {
            debug!("Bound target {:?} gone before release", target);
        }
        true
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> LockState {
        self.state
    }

    /// Whether a target is held right now.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        matches!(self.state, LockState::Locked { .. })
    }

    /// Whether `acquire` has ever succeeded.
    #[must_use]
    pub const fn was_acquired(&self) -> bool {
        self.acquired
    }

    /// Locked target.
    #[must_use]
    pub const fn target(&self) -> Option<EntityId> {
        self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::{Arena, Body};
    use harrow_common::Vec2;

    #[test]
    fn test_acquire_and_release_restores() {
        let mut arena = Arena::new();
        let target = arena.spawn(
            Body::new(Vec2::ZERO)
                .with_motor()
                .with_rigid_body(1.0)
                .with_velocity(Vec2::new(3.0, 0.0)),
        );

        let mut lock = BindLock::new();
        assert!(lock.acquire(&mut arena, target));
        let body = arena.body(target).expect("target");
        assert_eq!(body.velocity, Vec2::ZERO);
        assert_eq!(body.autonomous, Some(false));
        assert_eq!(body.kinematic, Some(true));
        assert_eq!(lock.state(), LockState::Locked { restore_kinematic: Some(false) });

        assert!(lock.release(&mut arena));
        let body = arena.body(target).expect("target");
        assert_eq!(body.autonomous, Some(true));
        assert_eq!(body.kinematic, Some(false));
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_acquire_only_once() {
        let mut arena = Arena::new();
        let a = arena.spawn(Body::new(Vec2::ZERO).with_motor());
        let b = arena.spawn(Body::new(Vec2::ONE).with_motor());
        let mut lock = BindLock::new();
        assert!(lock.acquire(&mut arena, a));
        lock.release(&mut arena);
        assert!(!lock.acquire(&mut arena, b));
        assert_eq!(arena.body(b).and_then(|body| body.autonomous), Some(true));
    }

    #[test]
    fn test_release_idempotent() {
        let mut arena = Arena::new();
        let target = arena.spawn(Body::new(Vec2::ZERO).with_motor());
        let mut lock = BindLock::new();
        assert!(!lock.release(&mut arena));
        lock.acquire(&mut arena, target);
        assert!(lock.release(&mut arena));
        assert!(!lock.release(&mut arena));
        assert!(!lock.release(&mut arena));
    }

    #[test]
    fn test_release_on_vanished_target() {
        let mut arena = Arena::new();
        let target = arena.spawn(Body::new(Vec2::ZERO).with_motor());
        let mut lock = BindLock::new();
        lock.acquire(&mut arena, target);
        arena.despawn(target);
        assert!(lock.release(&mut arena));
        assert_eq!(lock.state(), LockState::Free);
    }

    #[test]
    fn test_capabilities_independent() {
        let mut arena = Arena::new();
        // Rigid body only, no movement controller.
        let target = arena.spawn(Body::new(Vec2::ZERO).with_rigid_body(1.0));
        if let Some(body) = arena.body_mut(target) {
            body.kinematic = Some(true);
        }
        let mut lock = BindLock::new();
        assert!(lock.acquire(&mut arena, target));
        assert_eq!(lock.state(), LockState::Locked { restore_kinematic: Some(true) });
        lock.release(&mut arena);
        let body = arena.body(target).expect("target");
        assert_eq!(body.kinematic, Some(true));
        assert_eq!(body.autonomous, None);
    }
}
