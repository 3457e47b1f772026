//! Error types for the `habitat-world` crate.
//!
//! Every variant is a precondition violation: the caller asked the grid to
//! do something that would break the one-occupant-per-cell invariant or
//! addressed a cell that does not exist. None of these are ordinary
//! simulation outcomes.

use habitat_types::{AgentId, Location};

/// Errors that can occur during topology and environment operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The grid was configured with a zero or oversized dimension.
    #[error("invalid grid dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// The location lies outside the grid.
    #[error("location {0} is out of bounds")]
    OutOfBounds(Location),

    /// The cell already holds something that excludes the requested occupant.
    #[error("cell {location} is occupied by {occupant}")]
    CellOccupied {
        /// The contested cell.
        location: Location,
        /// What currently occupies it.
        occupant: &'static str,
    },

    /// The cell holds a stone.
    #[error("cell {0} is blocked by a stone")]
    CellBlocked(Location),

    /// No agent at the location.
    #[error("no agent at {0}")]
    NoAgentAt(Location),

    /// A different agent than expected occupies the cell.
    #[error("cell {location} holds agent {found}, expected {expected}")]
    AgentMismatch {
        /// The cell.
        location: Location,
        /// The agent the caller expected.
        expected: AgentId,
        /// The agent actually present.
        found: AgentId,
    },

    /// No food at the location.
    #[error("no food at {0}")]
    NoFoodAt(Location),

    /// No drop at the location.
    #[error("no drop at {0}")]
    NoDropAt(Location),

    /// No stone at the location.
    #[error("no stone at {0}")]
    NoStoneAt(Location),

    /// A food type index beyond the configured food types.
    #[error("unknown food type {food_type} (configured: {food_types})")]
    UnknownFoodType {
        /// The offending index.
        food_type: usize,
        /// Number of configured food types.
        food_types: usize,
    },
}
