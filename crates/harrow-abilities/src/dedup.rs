//! Hit deduplication registry.

use ahash::AHashSet;
use harrow_common::EntityId;
use serde::{Deserialize, Serialize};

/// How long a registered hit blocks further hits on the same target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HitPolicy {
    /// At most one hit per target for the whole activation.
    #[default]
    OncePerActivation,
    /// At most one hit per target per tick (continuous fields).
    OncePerFrame,
}

/// Set of targets already affected by one ability instance.
#[derive(Debug, Clone, Default)]
pub struct HitRegistry {
    policy: HitPolicy,
    hit: AHashSet<EntityId>,
    total: usize,
}

impl HitRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new(policy: HitPolicy) -> Self {
        Self {
            policy,
            hit: AHashSet::new(),
            total: 0,
        }
    }

    /// Called once at the start of each tick.
    pub fn begin_frame(&mut self) {
        if self.policy == HitPolicy::OncePerFrame {
            self.hit.clear();
        }
    }

    /// Record a hit. Returns `false` if the target was already recorded.
    pub fn insert(&mut self, target: EntityId) -> bool {
        let fresh = self.hit.insert(target);
        if fresh {
            self.total += 1;
        }
        fresh
    }

    /// Whether the target is currently blocked.
    #[must_use]
    pub fn contains(&self, target: EntityId) -> bool {
        self.hit.contains(&target)
    }

    /// Targets currently recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hit.len()
    }

    /// Whether nothing is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hit.is_empty()
    }

    /// Hits recorded over the registry's lifetime.
    #[must_use]
    pub const fn total_hits(&self) -> usize {
        self.total
    }

    /// Active policy.
    #[must_use]
    pub const fn policy(&self) -> HitPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_once_per_activation() {
        let mut registry = HitRegistry::new(HitPolicy::OncePerActivation);
        let target = EntityId::from_raw(7);

        assert!(registry.insert(target));
        registry.begin_frame();
        assert!(!registry.insert(target));
        assert!(registry.contains(target));
        assert_eq!(registry.total_hits(), 1);
    }

    #[test]
    fn test_once_per_frame() {
        let mut registry = HitRegistry::new(HitPolicy::OncePerFrame);
        let target = EntityId::from_raw(7);

        assert!(registry.insert(target));
        assert!(!registry.insert(target));
        registry.begin_frame();
        assert!(registry.is_empty());
        assert!(registry.insert(target));
        assert_eq!(registry.total_hits(), 2);
    }

    proptest! {
        #[test]
        fn prop_each_target_admitted_once(
            frames in proptest::collection::vec(proptest::collection::vec(1u64..20, 0..10), 1..30),
        ) {
            let mut registry = HitRegistry::new(HitPolicy::OncePerActivation);
            let mut admitted = std::collections::HashSet::new();
            for frame in frames {
                registry.begin_frame();
                for raw in frame {
                    if registry.insert(EntityId::from_raw(raw)) {
                        prop_assert!(admitted.insert(raw));
                    }
                }
            }
            prop_assert_eq!(registry.total_hits(), admitted.len());
        }
    }
}
