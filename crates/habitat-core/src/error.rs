//! Error types for the habitat-core crate.

use habitat_agents::AgentError;
use habitat_types::AgentId;
use habitat_world::WorldError;

use crate::config::ConfigError;

/// Errors that abort a tick.
///
/// Every variant is an invariant break or a failing mutator; ordinary
/// outcomes such as starvation never surface here.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A grid mutation was refused.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// An agent operation failed.
    #[error("agent error for {agent_id}: {source}")]
    Agent {
        /// The agent being processed.
        agent_id: AgentId,
        /// The underlying agent error.
        source: AgentError,
    },

    /// A mutator hook failed.
    #[error("mutator error: {source}")]
    Mutator {
        /// The error the hook returned.
        source: AgentError,
    },
}

impl TickError {
    pub(crate) const fn agent(agent_id: AgentId, source: AgentError) -> Self {
        Self::Agent { agent_id, source }
    }

    pub(crate) const fn mutator(source: AgentError) -> Self {
        Self::Mutator { source }
    }
}

/// Errors from building or driving a [`Simulation`](crate::Simulation)
/// outside a tick.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// The configuration was rejected.
    #[error("configuration error: {source}")]
    Config {
        /// The underlying configuration error.
        #[from]
        source: ConfigError,
    },

    /// A grid operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// An agent operation failed.
    #[error("agent error: {source}")]
    Agent {
        /// The underlying agent error.
        #[from]
        source: AgentError,
    },

    /// A spawn or kill triggered a failing hook.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },

    /// No empty cell was left to seed an agent on.
    #[error("no empty cell left for agent type {agent_type}")]
    GridFull {
        /// Type of the agent that could not be placed.
        agent_type: usize,
    },
}
