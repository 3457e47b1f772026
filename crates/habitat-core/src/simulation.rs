//! The simulation: construction, seeding, and the tick.
//!
//! A [`Simulation`] owns everything one run needs: the grid, the scheduler,
//! the living agents, the mutators and listeners, the id allocators, and
//! the single random source. Nothing is global, so several simulations can
//! run side by side.
//!
//! A tick advances time, updates the environment (packet expiry, waste
//! decay, food growth), then visits every agent registered when the tick
//! started, in registration order. Agents born during the tick are first
//! visited on the next one.

use std::collections::BTreeMap;

use tracing::{debug, info};

use habitat_agents::{
    AbioticMutator, Agent, AgentError, Controller, DiseaseMutator, Mutator, MutatorContext,
    MutatorRegistry, Parents, PhenotypeMutator, ProductionMutator,
};
use habitat_types::{
    AgentId, AgentType, DeathCause, IdAllocator, LocationDirection, PopulationStats,
    ReproductionMode,
};
use habitat_world::rng::seeded;
use habitat_world::{Environment, EnvironmentUpdate, SimRng, Topology};

use crate::config::SimulationConfig;
use crate::error::{SimulationError, TickError};
use crate::listener::PopulationListener;
use crate::scheduler::Scheduler;
use crate::stats;

/// Summary of a single tick's execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// Living agents at the end of the tick.
    pub agents_alive: u64,
    /// Agents born during the tick.
    pub births: u64,
    /// Agents that died during the tick.
    pub deaths: u64,
    /// What the environment update did.
    pub environment: EnvironmentUpdate,
}

/// One simulation instance.
pub struct Simulation {
    pub(crate) config: SimulationConfig,
    pub(crate) environment: Environment,
    pub(crate) scheduler: Scheduler<AgentId>,
    /// Living agents. The agent being updated is checked out of this map
    /// for the duration of its update.
    pub(crate) agents: BTreeMap<AgentId, Agent>,
    pub(crate) agent_ids: IdAllocator,
    pub(crate) packet_ids: IdAllocator,
    pub(crate) rng: SimRng,
    pub(crate) mutators: MutatorRegistry,
    pub(crate) listeners: Vec<Box<dyn PopulationListener>>,
    pub(crate) births: u64,
    pub(crate) deaths: u64,
}

impl core::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Simulation")
            .field("time", &self.scheduler.time())
            .field("agents", &self.agents.len())
            .field("mutators", &self.mutators.names())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Validate the configuration, build the grid, register the built-in
    /// mutators the configuration enables, and seed stones, agents, and
    /// food.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Config`] for inconsistent configuration
    /// and [`SimulationError::GridFull`] if seeding runs out of cells.
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        let mut sim = Self::empty(config)?;
        sim.seed()?;
        Ok(sim)
    }

    /// Like [`new`](Self::new) but places nothing on the grid.
    ///
    /// Useful for hand-built scenarios driven through
    /// [`spawn`](Self::spawn) and [`environment_mut`](Self::environment_mut).
    pub fn empty(mut config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        config.normalize();

        let topology = Topology::new(
            config.topology.width,
            config.topology.height,
            config.topology.wrap,
        )?;
        let environment = Environment::new(
            topology,
            config.food_types.len(),
            config.environment.packet_lifetime,
        );

        // Genes are expressed first so the other hooks see the agent's own
        // parameters; abiotic scaling goes last and starts from all of them.
        let mut mutators = MutatorRegistry::new();
        if !config.phenotype.genes.is_empty() {
            mutators.register(Box::new(PhenotypeMutator::new(config.phenotype.clone())));
        }
        if !config.disease.is_empty() {
            mutators.register(Box::new(DiseaseMutator::new(config.disease.clone())));
        }
        if !config.production.is_empty() {
            mutators.register(Box::new(ProductionMutator::new(config.production.clone())));
        }
        if !config.abiotic.factors.is_empty() {
            mutators.register(Box::new(AbioticMutator::new(config.abiotic.clone())));
        }

        let rng = seeded(config.world.seed);
        Ok(Self {
            config,
            environment,
            scheduler: Scheduler::new(),
            agents: BTreeMap::new(),
            agent_ids: IdAllocator::new(),
            packet_ids: IdAllocator::new(),
            rng,
            mutators,
            listeners: Vec::new(),
            births: 0,
            deaths: 0,
        })
    }

    fn seed(&mut self) -> Result<(), SimulationError> {
        let stones = self
            .environment
            .scatter_stones(self.config.environment.stones, &mut self.rng)?;

        let counts: Vec<u32> = self
            .config
            .agent_types
            .iter()
            .map(|p| p.initial_agents)
            .collect();
        for (index, count) in counts.into_iter().enumerate() {
            for _ in 0..count {
                let location = self
                    .environment
                    .random_empty_location(&mut self.rng)
                    .ok_or(SimulationError::GridFull { agent_type: index })?;
                let direction = self.environment.topology().get_random_direction(&mut self.rng);
                let controller = self.config.controller.build(&mut self.rng);
                self.spawn(
                    AgentType(index),
                    LocationDirection::new(location, direction),
                    controller,
                )?;
            }
        }

        let mut food: u32 = 0;
        for (food_type, params) in self.config.food_types.iter().enumerate() {
            let placed =
                self.environment
                    .scatter_food(food_type, params.initial_food, &mut self.rng)?;
            food = food.saturating_add(placed);
        }

        info!(
            agents = self.agents.len(),
            stones,
            food,
            mutators = ?self.mutators.names(),
            "Simulation seeded"
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Current tick. 0 before the first tick.
    pub const fn time(&self) -> u64 {
        self.scheduler.time()
    }

    /// The validated, normalized configuration.
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// The grid.
    pub const fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Direct grid access for building scenarios.
    pub const fn environment_mut(&mut self) -> &mut Environment {
        &mut self.environment
    }

    /// The scheduler registry.
    pub const fn scheduler(&self) -> &Scheduler<AgentId> {
        &self.scheduler
    }

    /// A living agent.
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    /// A living agent, mutably.
    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(&id)
    }

    /// Every living agent, by id.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    /// Number of living agents.
    pub fn population(&self) -> usize {
        self.agents.len()
    }

    /// The mutator registry.
    pub const fn mutators(&self) -> &MutatorRegistry {
        &self.mutators
    }

    /// Register another mutator after the built-in ones.
    pub fn add_mutator(&mut self, mutator: Box<dyn Mutator>) {
        self.mutators.register(mutator);
    }

    /// Register a population listener.
    pub fn add_listener(&mut self, listener: Box<dyn PopulationListener>) {
        self.listeners.push(listener);
    }

    /// Statistics for the current state.
    pub fn stats(&self) -> PopulationStats {
        stats::collect(
            self.time(),
            self.agents.values(),
            self.config.agent_types.len(),
            &self.mutators,
            &self.environment,
        )
    }

    // -----------------------------------------------------------------------
    // Population changes from outside a tick
    // -----------------------------------------------------------------------

    /// Place a new parentless agent.
    ///
    /// # Errors
    ///
    /// Fails if the type is unknown, the cell is not empty, or a spawn hook
    /// fails.
    pub fn spawn(
        &mut self,
        agent_type: AgentType,
        position: LocationDirection,
        controller: Box<dyn Controller>,
    ) -> Result<AgentId, SimulationError> {
        let params = self
            .config
            .agent_types
            .get(agent_type.index())
            .cloned()
            .ok_or(AgentError::UnknownAgentType {
                agent_type,
                configured: self.config.agent_types.len(),
            })?;
        if !self.environment.is_empty(position.location) {
            return Err(SimulationError::World {
                source: habitat_world::WorldError::CellOccupied {
                    location: position.location,
                    occupant: self
                        .environment
                        .cell(position.location)?
                        .occupant_name(),
                },
            });
        }

        let now = self.time();
        let id = self.agent_ids.next_agent();
        let mut agent = Agent::new(id, agent_type, position, params, controller, now);
        self.environment.set_agent(position.location, id)?;
        self.scheduler.add(id);
        agent.controller_mut().add_client_agent(id);

        let mut ctx = MutatorContext {
            time: now,
            rng: &mut self.rng,
            environment: &mut self.environment,
        };
        self.mutators
            .on_spawn(&mut agent, Parents::Seeded, &mut ctx)
            .map_err(TickError::mutator)?;
        self.notify_spawn(&agent, ReproductionMode::Seeded);

        debug!(tick = now, agent_id = %id, %agent_type, location = %position.location, "Agent seeded");
        self.agents.insert(id, agent);
        Ok(id)
    }

    /// Remove a living agent as if it had died.
    ///
    /// Returns `false` if no living agent has that id.
    ///
    /// # Errors
    ///
    /// Fails if a death hook fails.
    pub fn kill(&mut self, id: AgentId) -> Result<bool, SimulationError> {
        let Some(mut agent) = self.agents.remove(&id) else {
            return Ok(false);
        };
        self.die(&mut agent, DeathCause::Removed)?;
        Ok(true)
    }

    pub(crate) fn notify_spawn(&mut self, agent: &Agent, mode: ReproductionMode) {
        for listener in &mut self.listeners {
            listener.on_spawn(agent, mode);
        }
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Run one tick.
    ///
    /// # Errors
    ///
    /// Any [`TickError`] aborts the tick; the simulation should not be
    /// ticked again afterwards.
    pub fn tick(&mut self) -> Result<TickSummary, TickError> {
        let visit = self.scheduler.begin_tick();
        let now = self.scheduler.time();
        self.births = 0;
        self.deaths = 0;

        let environment = self
            .environment
            .update(now, &self.config.food_types, &mut self.rng)?;

        for id in visit {
            self.update_agent(id)?;
        }

        if !self.listeners.is_empty() {
            let stats = self.stats();
            for listener in &mut self.listeners {
                listener.on_tick(&stats);
            }
        }

        let agents_alive = u64::try_from(self.agents.len()).unwrap_or(u64::MAX);
        debug!(
            tick = now,
            agents_alive,
            births = self.births,
            deaths = self.deaths,
            "Tick complete"
        );
        Ok(TickSummary {
            tick: now,
            agents_alive,
            births: self.births,
            deaths: self.deaths,
            environment,
        })
    }
}
