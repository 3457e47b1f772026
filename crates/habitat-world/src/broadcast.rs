//! In-flight broadcast packets.
//!
//! Agents announce food and breeding opportunities by dropping a packet
//! into the conduit. Every packet has a reach (topology distance from its
//! origin) and a lifetime in ticks; expired packets are purged at the
//! start of each tick.

use serde::{Deserialize, Serialize};

use habitat_types::{AgentId, Location, PacketId};

use crate::topology::Topology;

/// What a packet announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PacketKind {
    /// Food was found at `location`.
    Food {
        /// Where the food was.
        location: Location,
    },
    /// The sender is ready to breed at `location`.
    Breed {
        /// Where the sender was.
        location: Location,
    },
}

impl PacketKind {
    /// The location the packet points at.
    pub const fn target(&self) -> Location {
        match self {
            Self::Food { location } | Self::Breed { location } => *location,
        }
    }
}

/// One broadcast message.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BroadcastPacket {
    /// Packet identity.
    pub id: PacketId,
    /// The agent that sent it.
    pub sender: AgentId,
    /// Where the sender stood.
    pub origin: Location,
    /// Maximum topology distance from `origin` at which it can be heard.
    pub range: f64,
    /// Payload.
    pub kind: PacketKind,
    /// Tick it was sent.
    pub created_at: u64,
}

/// The environment's packet queue.
#[derive(Debug, Clone, Default)]
pub struct BroadcastConduit {
    packets: Vec<BroadcastPacket>,
    lifetime: u64,
}

impl BroadcastConduit {
    /// Create an empty conduit whose packets live for `lifetime` ticks.
    pub const fn new(lifetime: u64) -> Self {
        Self {
            packets: Vec::new(),
            lifetime,
        }
    }

    /// Queue a packet.
    pub fn add_packet(&mut self, packet: BroadcastPacket) {
        self.packets.push(packet);
    }

    /// Drop every packet whose lifetime has elapsed at `now`.
    ///
    /// Returns how many were dropped.
    pub fn expire(&mut self, now: u64) -> usize {
        let before = self.packets.len();
        let lifetime = self.lifetime;
        self.packets
            .retain(|p| now.saturating_sub(p.created_at) < lifetime);
        before.saturating_sub(self.packets.len())
    }

    /// First packet audible at `location` that was not sent by `receiver`.
    pub fn find_packet(
        &self,
        topology: &Topology,
        location: Location,
        receiver: AgentId,
    ) -> Option<&BroadcastPacket> {
        self.packets
            .iter()
            .find(|p| p.sender != receiver && topology.get_distance(p.origin, location) <= p.range)
    }

    /// Remove every packet.
    pub fn clear(&mut self) {
        self.packets.clear();
    }

    /// Packets currently in flight.
    pub fn len(&self) -> usize {
        self.packets.len()
    }

    /// Whether no packets are in flight.
    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// Iterate packets in send order.
    pub fn iter(&self) -> impl Iterator<Item = &BroadcastPacket> {
        self.packets.iter()
    }
}
