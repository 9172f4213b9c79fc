//! # Harrow Common
//!
//! Common types and shared abstractions for the Harrow ability engine.
//!
//! This crate provides the foundational types used by every Harrow crate:
//! - ID types (EntityId, InstanceId, VisualId)
//! - Target layer flags for eligibility filtering
//! - 2D math helpers on top of `glam::Vec2`
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;
pub mod layers;
pub mod math;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::layers::*;
    pub use crate::math::*;
}

pub use prelude::*;
