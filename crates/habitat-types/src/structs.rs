//! Value types for grid addressing and statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::Direction;
use crate::ids::AgentType;

/// A grid cell address.
///
/// Locations carry no behaviour beyond identity; adjacency and distance are
/// the topology's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Column, `0..width`.
    pub x: u32,
    /// Row, `0..height`.
    pub y: u32,
}

impl Location {
    /// Create a location from coordinates.
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl core::fmt::Display for Location {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A location plus a facing direction.
///
/// Created per movement decision and discarded after use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationDirection {
    /// The cell.
    pub location: Location,
    /// The facing.
    pub direction: Direction,
}

impl LocationDirection {
    /// Pair a location with a facing.
    pub const fn new(location: Location, direction: Direction) -> Self {
        Self {
            location,
            direction,
        }
    }
}

/// Aggregate statistics for one agent type at the end of a tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeStats {
    /// The agent type these numbers describe.
    pub agent_type: AgentType,
    /// Living agents of this type.
    pub population: u64,
    /// Sum of the energy of all living agents of this type.
    pub total_energy: i64,
    /// Extension-specific columns (e.g. `"sick"`), keyed by column name.
    pub extra: BTreeMap<String, i64>,
}

/// Population statistics for the whole simulation at the end of a tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationStats {
    /// Tick the numbers were collected at.
    pub tick: u64,
    /// One entry per configured agent type, in type order.
    pub per_type: Vec<TypeStats>,
    /// Living agents across all types.
    pub total_population: u64,
    /// Energy summed across all living agents.
    pub total_energy: i64,
    /// Extension columns summed across types.
    pub total_extra: BTreeMap<String, i64>,
}

impl PopulationStats {
    /// Look up the stats for one agent type.
    pub fn for_type(&self, agent_type: AgentType) -> Option<&TypeStats> {
        self.per_type.get(agent_type.index())
    }
}
