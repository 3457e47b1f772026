//! Type-safe identifier wrappers.
//!
//! Every entity in the simulation has a strongly-typed ID to prevent
//! accidental mixing of identifiers at compile time. Agent IDs are
//! sequential integers handed out by an allocator owned by the simulation,
//! so two runs with the same seed allocate the same IDs in the same order.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around `u64` with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Return the raw numeric value.
            pub const fn into_inner(self) -> u64 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for an agent in the simulation.
    AgentId
}

define_id! {
    /// Unique identifier for a broadcast packet in flight.
    PacketId
}

/// Index of an agent type (its row in every per-type parameter table).
///
/// Agent types carry economic and behavioural meaning: each one has its own
/// parameter bundle, food-web row, and disease/production settings.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AgentType(pub usize);

impl AgentType {
    /// Return the table index for this type.
    pub const fn index(self) -> usize {
        self.0
    }
}

impl core::fmt::Display for AgentType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sequential ID source.
///
/// IDs start at 1 and are never reused within a simulation instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    /// Create an allocator whose first ID is 1.
    pub const fn new() -> Self {
        Self { next: 1 }
    }

    /// Allocate the next agent ID.
    pub const fn next_agent(&mut self) -> AgentId {
        AgentId(self.bump())
    }

    /// Allocate the next packet ID.
    pub const fn next_packet(&mut self) -> PacketId {
        PacketId(self.bump())
    }

    /// Peek at the next value without consuming it.
    pub const fn peek(&self) -> u64 {
        self.next
    }

    const fn bump(&mut self) -> u64 {
        let id = self.next;
        self.next = self.next.saturating_add(1);
        id
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
