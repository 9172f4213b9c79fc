//! Target category flags.

/// Category bits used by target filters.
#[allow(non_snake_case)]
pub mod TargetLayer {
    /// Layer flag type.
    pub type Flags = u32;

    /// The player character.
    pub const PLAYER: Flags = 1 << 0;
    /// Hostile creatures.
    pub const ENEMY: Flags = 1 << 1;
    /// Bosses (usually also ENEMY).
    pub const BOSS: Flags = 1 << 2;
    /// Neutral critters and NPCs.
    pub const NEUTRAL: Flags = 1 << 3;
    /// Breakable props.
    pub const DESTRUCTIBLE: Flags = 1 << 4;
    /// All layers.
    pub const ALL: Flags = 0xFFFF_FFFF;
    /// No layers.
    pub const NONE: Flags = 0;

    /// Default mask for player abilities.
    pub const PLAYER_ABILITY: Flags = ENEMY | BOSS | DESTRUCTIBLE;

    /// Whether two masks share at least one bit.
    #[must_use]
    pub const fn intersects(mask: Flags, layers: Flags) -> bool {
        (mask & layers) != 0
    }
}
