//! Drops: cell occupants that are neither agents, food, nor stones.

use serde::{Deserialize, Serialize};

use habitat_types::{AgentId, AgentType};

/// Something left on the grid by an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Drop {
    /// Excreted waste. Blocks movement until it decays.
    Waste {
        /// Tick the waste was placed.
        created_at: u64,
        /// Ticks until it disappears.
        lifetime: u64,
    },
    /// A product placed by a producing agent. Consumed by whoever steps on it.
    Product {
        /// The agent that produced it.
        producer: AgentId,
        /// The producer's type, for per-type accounting.
        producer_type: AgentType,
        /// Energy granted to the consumer.
        value: i32,
    },
}

impl Drop {
    /// Whether an agent may step onto the cell holding this drop.
    pub const fn can_step(&self) -> bool {
        matches!(self, Self::Product { .. })
    }

    /// Whether this drop has run out its lifetime at `now`.
    pub const fn is_expired(&self, now: u64) -> bool {
        match self {
            Self::Waste {
                created_at,
                lifetime,
            } => now.saturating_sub(*created_at) >= *lifetime,
            Self::Product { .. } => false,
        }
    }
}
