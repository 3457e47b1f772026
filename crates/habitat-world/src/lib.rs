//! Topology, environment grid, food, drops, and broadcasts for the Habitat
//! simulation.
//!
//! # Modules
//!
//! - [`topology`] -- Grid shape, adjacency, facing rotation, distance, and
//!   random sampling over bounded or wrapped grids.
//! - [`environment`] -- The cell grid with mutually exclusive occupancy and
//!   the per-tick environment update (packet expiry, waste decay, food growth).
//! - [`broadcast`] -- In-flight broadcast packets and their reach.
//! - [`drop`] -- Waste and product drops.
//! - [`food`] -- Per-food-type growth settings.
//! - [`rng`] -- The simulation's seeded random source and draw helpers.
//! - [`error`] -- Precondition violations on the grid.

pub mod broadcast;
pub mod drop;
pub mod environment;
pub mod error;
pub mod food;
pub mod rng;
pub mod topology;

// Re-export primary types at crate root.
pub use broadcast::{BroadcastConduit, BroadcastPacket, PacketKind};
pub use drop::Drop;
pub use environment::{Cell, Environment, EnvironmentUpdate};
pub use error::WorldError;
pub use food::FoodParams;
pub use rng::SimRng;
pub use topology::Topology;
