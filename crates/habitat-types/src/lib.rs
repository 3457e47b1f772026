//! Shared type definitions for the Habitat simulation.
//!
//! This crate is the single source of truth for the small value types used
//! across the Habitat workspace: identifiers, directions, actions, and the
//! statistics rows reported each tick.
//!
//! # Modules
//!
//! - [`ids`] -- Sequential identifier wrappers and their allocator
//! - [`enums`] -- Enumeration types (directions, actions, causes)
//! - [`structs`] -- Grid addressing and population statistics

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{Action, DeathCause, Direction, EnergyCause, ReproductionMode};
pub use ids::{AgentId, AgentType, IdAllocator, PacketId};
pub use structs::{Location, LocationDirection, PopulationStats, TypeStats};
