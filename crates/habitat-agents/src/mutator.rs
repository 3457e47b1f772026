//! Mutator capability traits and ordered dispatch.
//!
//! A mutator is an independently registered behavioural extension. Each one
//! implements [`Mutator`] and exposes whichever hook capabilities it
//! supports through the `as_*` accessors. The [`MutatorRegistry`] delivers
//! every hook to every capable mutator in registration order, synchronously.
//!
//! Mutators own any per-agent state they need, either privately (keyed by
//! [`AgentId`](habitat_types::AgentId)) or in the agent's
//! [`ExtensionBag`](crate::extension::ExtensionBag), and must release it in
//! [`DeathMutator::on_death`]. A hook that returns `Err` aborts the tick.

use std::any::Any;

use habitat_types::AgentType;
use habitat_world::{Environment, SimRng};

use crate::agent::Agent;
use crate::error::AgentError;

/// Shared simulation resources handed to every hook.
#[derive(Debug)]
pub struct MutatorContext<'a> {
    /// Current tick.
    pub time: u64,
    /// The simulation's random source.
    pub rng: &'a mut SimRng,
    /// The grid.
    pub environment: &'a mut Environment,
}

/// How a spawned agent came to be.
#[derive(Debug, Clone, Copy)]
pub enum Parents<'a> {
    /// Placed at simulation start or by an external request.
    Seeded,
    /// Born to one parent.
    Asexual(&'a Agent),
    /// Born to two parents.
    Sexual(&'a Agent, &'a Agent),
}

impl Parents<'_> {
    /// Whether any living parent satisfies `predicate`.
    pub fn any_alive(&self, mut predicate: impl FnMut(&Agent) -> bool) -> bool {
        match *self {
            Self::Seeded => false,
            Self::Asexual(parent) => parent.is_alive() && predicate(parent),
            Self::Sexual(first, second) => {
                (first.is_alive() && predicate(first)) || (second.is_alive() && predicate(second))
            }
        }
    }
}

/// Reacts to agents entering the simulation.
pub trait SpawnMutator {
    /// Called once after `agent` is placed and scheduled.
    fn on_spawn(
        &mut self,
        agent: &mut Agent,
        parents: Parents<'_>,
        ctx: &mut MutatorContext<'_>,
    ) -> Result<(), AgentError>;
}

/// Reacts to one agent bumping into another.
pub trait ContactMutator {
    /// Called once per bump event. Direction-sensitive mutators resolve
    /// both orderings themselves.
    fn on_contact(
        &mut self,
        bumper: &mut Agent,
        bumpee: &mut Agent,
        ctx: &mut MutatorContext<'_>,
    ) -> Result<(), AgentError>;
}

/// Runs once per living agent per tick, after its action resolved.
pub trait UpdateMutator {
    /// Per-tick hook.
    fn on_update(&mut self, agent: &mut Agent, ctx: &mut MutatorContext<'_>)
    -> Result<(), AgentError>;
}

/// Reacts to deaths.
pub trait DeathMutator {
    /// Called after the agent's cell was released and it was descheduled.
    fn on_death(&mut self, agent: &Agent, ctx: &mut MutatorContext<'_>) -> Result<(), AgentError>;
}

/// Contributes named statistics columns.
pub trait LoggingMutator {
    /// Column values for one agent type.
    fn log_columns(&self, agent_type: AgentType, environment: &Environment)
    -> Vec<(&'static str, i64)>;
}

/// A registered extension. Capabilities default to absent.
pub trait Mutator: Send + core::fmt::Debug {
    /// Short name used in errors and logs.
    fn name(&self) -> &'static str;

    /// Spawn capability.
    fn as_spawn(&mut self) -> Option<&mut dyn SpawnMutator> {
        None
    }

    /// Contact capability.
    fn as_contact(&mut self) -> Option<&mut dyn ContactMutator> {
        None
    }

    /// Update capability.
    fn as_update(&mut self) -> Option<&mut dyn UpdateMutator> {
        None
    }

    /// Death capability.
    fn as_death(&mut self) -> Option<&mut dyn DeathMutator> {
        None
    }

    /// Logging capability.
    fn as_logging(&self) -> Option<&dyn LoggingMutator> {
        None
    }

    /// Concrete access for callers that know the mutator's type.
    fn as_any(&self) -> &dyn Any;
}

/// Registration-ordered mutator dispatch.
#[derive(Debug, Default)]
pub struct MutatorRegistry {
    mutators: Vec<Box<dyn Mutator>>,
}

impl MutatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a mutator. Later registrations run after earlier ones.
    pub fn register(&mut self, mutator: Box<dyn Mutator>) {
        tracing::debug!(mutator = mutator.name(), "Mutator registered");
        self.mutators.push(mutator);
    }

    /// Number of registered mutators.
    pub fn len(&self) -> usize {
        self.mutators.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.mutators.is_empty()
    }

    /// Registered names, in dispatch order.
    pub fn names(&self) -> Vec<&'static str> {
        self.mutators.iter().map(|m| m.name()).collect()
    }

    /// First registered mutator of type `T`.
    pub fn find<T: Mutator + 'static>(&self) -> Option<&T> {
        self.mutators
            .iter()
            .find_map(|m| m.as_any().downcast_ref::<T>())
    }

    /// Deliver a spawn event.
    pub fn on_spawn(
        &mut self,
        agent: &mut Agent,
        parents: Parents<'_>,
        ctx: &mut MutatorContext<'_>,
    ) -> Result<(), AgentError> {
        for mutator in &mut self.mutators {
            if let Some(hook) = mutator.as_spawn() {
                hook.on_spawn(agent, parents, ctx)?;
            }
        }
        Ok(())
    }

    /// Deliver a contact event.
    pub fn on_contact(
        &mut self,
        bumper: &mut Agent,
        bumpee: &mut Agent,
        ctx: &mut MutatorContext<'_>,
    ) -> Result<(), AgentError> {
        for mutator in &mut self.mutators {
            if let Some(hook) = mutator.as_contact() {
                hook.on_contact(bumper, bumpee, ctx)?;
            }
        }
        Ok(())
    }

    /// Deliver a per-tick update.
    pub fn on_update(
        &mut self,
        agent: &mut Agent,
        ctx: &mut MutatorContext<'_>,
    ) -> Result<(), AgentError> {
        for mutator in &mut self.mutators {
            if let Some(hook) = mutator.as_update() {
                hook.on_update(agent, ctx)?;
            }
        }
        Ok(())
    }

    /// Deliver a death event.
    pub fn on_death(&mut self, agent: &Agent, ctx: &mut MutatorContext<'_>) -> Result<(), AgentError> {
        for mutator in &mut self.mutators {
            if let Some(hook) = mutator.as_death() {
                hook.on_death(agent, ctx)?;
            }
        }
        Ok(())
    }

    /// Columns from every logging mutator, in registration order.
    pub fn log_columns(
        &self,
        agent_type: AgentType,
        environment: &Environment,
    ) -> Vec<(&'static str, i64)> {
        self.mutators
            .iter()
            .filter_map(|m| m.as_logging())
            .flat_map(|log| log.log_columns(agent_type, environment))
            .collect()
    }
}
