//! Error types for the habitat-agents crate.
//!
//! Ordinary simulation outcomes (starving, failing a breeding roll, finding
//! no free cell) are never errors. The variants here are invariant breaks
//! and failing mutator hooks, both of which abort the current tick.

use habitat_types::{AgentId, AgentType};
use habitat_world::WorldError;

/// Errors that can occur during agent operations.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// An action was invoked on an agent that has already died.
    #[error("agent {0} is dead")]
    AgentDead(AgentId),

    /// Agent with the given ID is not registered.
    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),

    /// An agent type index beyond the configured agent types.
    #[error("unknown agent type {agent_type} (configured: {configured})")]
    UnknownAgentType {
        /// The offending type.
        agent_type: AgentType,
        /// Number of configured agent types.
        configured: usize,
    },

    /// A mutator hook failed.
    #[error("mutator {mutator} failed: {reason}")]
    Mutator {
        /// Name of the failing mutator.
        mutator: &'static str,
        /// What went wrong.
        reason: String,
    },

    /// A grid operation issued by an agent or mutator was refused.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },
}
