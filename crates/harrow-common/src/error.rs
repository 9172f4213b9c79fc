//! Error types for Harrow.

use crate::ids::EntityId;
use thiserror::Error;

/// Errors surfaced by ability activation and configuration.
///
/// Nothing here is fatal: a rejected activation simply never creates an
/// instance.
#[derive(Debug, Error)]
pub enum AbilityError {
    /// No owner entity could be resolved
    #[error("no owner entity available")]
    MissingOwner,

    /// Owner handle is stale
    #[error("owner entity {0:?} is not valid")]
    InvalidOwner(EntityId),

    /// Required target is missing or destroyed
    #[error("target entity {0:?} is missing or destroyed")]
    MissingTarget(EntityId),

    /// Host refused to spawn the visual carrier
    #[error("visual carrier for {0} could not be spawned")]
    VisualUnavailable(&'static str),

    /// Configuration problem
    #[error("config error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AbilityError {
    /// Whether the error is an activation precondition failure.
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::MissingOwner
                | Self::InvalidOwner(_)
                | Self::MissingTarget(_)
                | Self::VisualUnavailable(_)
        )
    }
}

/// Result type alias for Harrow operations.
pub type AbilityResult<T> = Result<T, AbilityError>;
