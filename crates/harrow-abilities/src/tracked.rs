//! Weak entity references with a last-known-position cache.

use harrow_common::{EntityId, Vec2};
use tracing::debug;

use crate::world::AbilityWorld;

/// Entity handle that may go stale mid-ability.
///
/// `refresh` re-reads the position every tick while the handle is live and
/// returns the cached value once it is not. A lost handle stays lost.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedEntity {
    entity: EntityId,
    live: bool,
    anchor: Option<String>,
    last_position: Vec2,
}

impl TrackedEntity {
    /// Start tracking. Returns `None` if the entity is not live right now.
    pub fn new<W: AbilityWorld + ?Sized>(
        world: &W,
        entity: EntityId,
        anchor: Option<String>,
    ) -> Option<Self> {
        if !world.is_valid(entity) {
            return None;
        }
        let position = Self::read(world, entity, anchor.as_deref())?;
        Some(Self {
            entity,
            live: true,
            anchor,
            last_position: position,
        })
    }

    fn read<W: AbilityWorld + ?Sized>(
        world: &W,
        entity: EntityId,
        anchor: Option<&str>,
    ) -> Option<Vec2> {
        anchor
            .and_then(|name| world.anchor(entity, name))
            .or_else(|| world.position(entity))
    }

    /// Re-read the position, falling back to the cache.
    pub fn refresh<W: AbilityWorld + ?Sized>(&mut self, world: &W) -> Vec2 {
        if !self.live {
            return self.last_position;
        }
        match Self::read(world, self.entity, self.anchor.as_deref()) {
            Some(position) if world.is_valid(self.entity) => {
                self.last_position = position;
            },
            _ => {
                debug!("Lost track of {:?}, holding {:?}", self.entity, self.last_position);
                self.live = false;
            },
        }
        self.last_position
    }

    /// Handle, whether or not it is still live.
    #[must_use]
    pub const fn entity(&self) -> EntityId {
        self.entity
    }

    /// Handle, only while live.
    #[must_use]
    pub const fn live_entity(&self) -> Option<EntityId> {
        if self.live {
            Some(self.entity)
        } else {
            None
        }
    }

    /// Whether the last refresh found the entity.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.live
    }

    /// Last observed position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.last_position
    }
}
