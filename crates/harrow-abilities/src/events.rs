//! Ability event bus.
//!
//! Instances publish what they did; the host drains the bus after each
//! tick to drive sound, UI and analytics.

use crossbeam_channel::{bounded, Receiver, Sender};
use harrow_common::{EntityId, InstanceId, Vec2};
use serde::{Deserialize, Serialize};

use crate::effects::EffectOutcome;
use crate::instance::AbilityKind;

/// Something an ability did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AbilityEvent {
    /// An instance was created.
    Activated {
        /// Instance.
        instance: InstanceId,
        /// Ability kind.
        kind: AbilityKind,
        /// Caster.
        owner: EntityId,
    },
    /// Activation preconditions failed.
    Rejected {
        /// Ability kind.
        kind: AbilityKind,
        /// Diagnostic.
        reason: String,
    },
    /// A target was struck.
    Hit {
        /// Instance.
        instance: InstanceId,
        /// Resolved effects.
        outcome: EffectOutcome,
    },
    /// The bind tether locked its target.
    Bound {
        /// Instance.
        instance: InstanceId,
        /// Locked target.
        target: EntityId,
        /// Where the tether caught it.
        at: Vec2,
    },
    /// The bind tether let go.
    Released {
        /// Instance.
        instance: InstanceId,
        /// Released target.
        target: EntityId,
        /// Released before the hold phase finished.
        early: bool,
    },
    /// Harvest collected its targets.
    HarvestMarked {
        /// Instance.
        instance: InstanceId,
        /// Collected targets.
        targets: Vec<EntityId>,
        /// Heal fixed at collection.
        total_heal: f32,
    },
    /// Harvest executed its batch.
    Harvested {
        /// Instance.
        instance: InstanceId,
        /// Targets killed.
        executed: Vec<EntityId>,
        /// Health restored to the invoker.
        healed: f32,
    },
    /// An instance finished or was cancelled.
    Disposed {
        /// Instance.
        instance: InstanceId,
        /// Ability kind.
        kind: AbilityKind,
        /// Cancelled rather than completed.
        cancelled: bool,
    },
}

/// Bounded event bus.
#[derive(Debug)]
pub struct AbilityEventBus {
    sender: Sender<AbilityEvent>,
    receiver: Receiver<AbilityEvent>,
    capacity: usize,
}

impl Default for AbilityEventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl AbilityEventBus {
    /// Create a bus holding at most `capacity` pending events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Publish an event. Dropped when the bus is full.
    pub fn publish(&self, event: AbilityEvent) {
        let _ = self.sender.try_send(event);
    }

    /// Take every pending event.
    pub fn drain(&self) -> Vec<AbilityEvent> {
        self.receiver.try_iter().collect()
    }

    /// Pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Extra sender handle.
    #[must_use]
    pub fn sender(&self) -> Sender<AbilityEvent> {
        self.sender.clone()
    }
}
