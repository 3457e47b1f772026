//! Product placement.
//!
//! Each tick a producing agent may leave a [`Drop::Product`] on a free cell
//! beside it. Products are consumed by whichever agent steps on them, which
//! gains the product's energy.

use std::any::Any;

use tracing::trace;

use habitat_types::AgentType;
use habitat_world::Environment;
use habitat_world::rng::roll;
use habitat_world::Drop;

use crate::agent::Agent;
use crate::config::ProductionParams;
use crate::error::AgentError;
use crate::mutator::{LoggingMutator, Mutator, MutatorContext, UpdateMutator};

/// Per-agent production record, kept in the agent's extension bag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductionState {
    /// Products this agent has placed.
    pub produced: u64,
}

/// Places products next to producing agents.
#[derive(Debug)]
pub struct ProductionMutator {
    params: Vec<ProductionParams>,
}

impl ProductionMutator {
    /// Create the mutator with one parameter set per agent type.
    pub const fn new(params: Vec<ProductionParams>) -> Self {
        Self { params }
    }
}

impl UpdateMutator for ProductionMutator {
    fn on_update(&mut self, agent: &mut Agent, ctx: &mut MutatorContext<'_>) -> Result<(), AgentError> {
        let agent_type = agent.agent_type();
        let params = self
            .params
            .get(agent_type.index())
            .ok_or(AgentError::UnknownAgentType {
                agent_type,
                configured: self.params.len(),
            })?;
        if !roll(ctx.rng, params.produce_chance) {
            return Ok(());
        }
        let Some(spot) = ctx
            .environment
            .first_empty_facing(agent.location(), agent.facing())
        else {
            return Ok(());
        };
        ctx.environment.add_drop(
            spot,
            Drop::Product {
                producer: agent.id(),
                producer_type: agent_type,
                value: params.product_energy,
            },
        )?;
        agent
            .extensions_mut()
            .update::<ProductionState>(|s| s.produced = s.produced.saturating_add(1));
        trace!(agent_id = %agent.id(), location = %spot, "Product placed");
        Ok(())
    }
}

impl LoggingMutator for ProductionMutator {
    fn log_columns(&self, agent_type: AgentType, environment: &Environment) -> Vec<(&'static str, i64)> {
        let products = environment.count_drops(
            |d| matches!(d, Drop::Product { producer_type, .. } if *producer_type == agent_type),
        );
        vec![("products", i64::try_from(products).unwrap_or(i64::MAX))]
    }
}

impl Mutator for ProductionMutator {
    fn name(&self) -> &'static str {
        "production"
    }

    fn as_update(&mut self) -> Option<&mut dyn UpdateMutator> {
        Some(self)
    }

    fn as_logging(&self) -> Option<&dyn LoggingMutator> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
