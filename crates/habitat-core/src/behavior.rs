//! The per-agent state machine run once per agent per tick.
//!
//! The agent being updated is checked out of the simulation's agent map,
//! driven through its action as `&mut Agent`, and put back if it is still
//! alive. Every other agent it touches (bumpee, victim, partner) is reached
//! through the map.
//!
//! Order within one update:
//!
//! 1. old age kills before anything else;
//! 2. broadcasts are received;
//! 3. the controller decides;
//! 4. the action runs (step, turn, or rest);
//! 5. the age penalty applies, then starvation, then pregnancy bookkeeping;
//! 6. update mutators run;
//! 7. the message inbox is cleared.
//!
//! Random draws happen in exactly this order, so changing it changes every
//! seeded run.

use tracing::debug;

use habitat_agents::config::truncate_to_i32;
use habitat_agents::{
    Agent, AgentError, ControllerInput, MutatorContext, Parents, Sensed, genome_similarity,
};
use habitat_types::{
    Action, AgentId, DeathCause, EnergyCause, Location, LocationDirection, ReproductionMode,
};
use habitat_world::rng::roll;
use habitat_world::{BroadcastPacket, Cell, Drop, PacketKind};

use crate::error::TickError;
use crate::simulation::Simulation;

impl Simulation {
    /// Update one scheduled agent. Agents that died earlier in the tick are
    /// no longer in the map and are skipped.
    pub(crate) fn update_agent(&mut self, id: AgentId) -> Result<(), TickError> {
        let Some(mut agent) = self.agents.remove(&id) else {
            return Ok(());
        };
        let result = self.run_agent(&mut agent);
        if agent.is_alive() {
            self.agents.insert(id, agent);
        }
        result
    }

    fn run_agent(&mut self, agent: &mut Agent) -> Result<(), TickError> {
        let now = self.time();

        if agent.params().aging_mode && agent.age(now) >= agent.params().aging_limit {
            return self.die(agent, DeathCause::OldAge);
        }

        if agent.params().broadcast_mode {
            self.receive_broadcast(agent);
        }

        let input = self.controller_input(agent);
        let decision = agent.controller_mut().control_agent(&input, &mut self.rng);
        if let Some(memory) = decision.memory {
            agent.set_memory(memory);
        }
        if let Some(outbox) = decision.comm_outbox {
            agent.set_comm_outbox(outbox);
        }
        agent.set_should_reproduce_asex(decision.reproduce_asex);

        match decision.action {
            Action::StepForward => self.step(agent)?,
            Action::TurnLeft => self.turn(agent, true),
            Action::TurnRight => self.turn(agent, false),
            Action::Rest => {}
        }

        self.after_action(agent)?;

        if agent.is_alive() {
            let mut ctx = MutatorContext {
                time: now,
                rng: &mut self.rng,
                environment: &mut self.environment,
            };
            self.mutators
                .on_update(agent, &mut ctx)
                .map_err(TickError::mutator)?;
            if agent.energy() <= 0 {
                self.die(agent, DeathCause::Starvation)?;
            }
        }

        agent.clear_comm_inbox();
        Ok(())
    }

    fn controller_input(&self, agent: &Agent) -> ControllerInput {
        let ahead = self
            .environment
            .topology()
            .get_adjacent(agent.location(), agent.facing())
            .and_then(|loc| self.environment.cell(loc).ok());
        let own_id = agent.id();
        let own_type = agent.agent_type();
        let sensed = Sensed::classify(ahead, own_type, |id| {
            if id == own_id {
                Some(own_type)
            } else {
                self.agents.get(&id).map(Agent::agent_type)
            }
        });
        ControllerInput {
            agent: own_id,
            agent_type: own_type,
            energy: agent.energy(),
            breed_energy: agent.params().breed_energy,
            facing: agent.facing(),
            ahead: sensed,
            memory: agent.memory(),
            comm_inbox: agent.comm_inbox(),
            age: agent.age(self.time()),
            pregnant: agent.is_pregnant(),
        }
    }

    /// Age penalty, starvation, and pregnancy bookkeeping after any action.
    fn after_action(&mut self, agent: &mut Agent) -> Result<(), TickError> {
        if !agent.is_alive() {
            return Ok(());
        }
        let penalty = agent.energy_penalty(self.time());
        if penalty > 0 {
            agent.spend_energy(penalty, EnergyCause::AgingPenalty);
        }
        if agent.energy() <= 0 {
            return self.die(agent, DeathCause::Starvation);
        }
        if agent.is_pregnant() && !agent.enough_energy(agent.params().breed_energy) {
            debug!(agent_id = %agent.id(), energy = agent.energy(), "Pregnancy aborted");
            agent.end_pregnancy();
        }
        agent.advance_pregnancy();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    fn step(&mut self, agent: &mut Agent) -> Result<(), TickError> {
        let Some(dest) = self
            .environment
            .topology()
            .get_adjacent(agent.location(), agent.facing())
        else {
            bump_wall(agent);
            return Ok(());
        };

        match self.environment.cell(dest)? {
            Cell::Empty | Cell::Food(_) => self.step_free(agent, dest),
            Cell::Agent(other) if other == agent.id() => {
                bump_wall(agent);
                Ok(())
            }
            Cell::Agent(other) => self.bump_agent(agent, other),
            Cell::Drop(Drop::Product { value, .. }) => {
                self.environment.remove_drop(dest)?;
                agent.change_energy(value, EnergyCause::Plugin);
                self.step_free(agent, dest)
            }
            Cell::Stone | Cell::Drop(Drop::Waste { .. }) => {
                bump_wall(agent);
                Ok(())
            }
        }
    }

    /// Step onto a cell holding nothing, or food.
    fn step_free(&mut self, agent: &mut Agent, dest: Location) -> Result<(), TickError> {
        let mut blocked = false;
        let mut waste_due = false;

        if let Some(food_type) = self.environment.get_food_type(dest) {
            if agent.can_broadcast() {
                self.broadcast(agent, PacketKind::Food { location: dest });
            }
            if agent.params().food_web.eats_food(food_type) {
                self.environment.remove_food(dest)?;
                let (gain, cause) = if food_type == agent.agent_type().index() {
                    (agent.params().food_energy, EnergyCause::EatFavoriteFood)
                } else {
                    (agent.params().other_food_energy, EnergyCause::EatFood)
                };
                agent.change_energy(gain, cause);
                waste_due = agent.record_food_gain(gain);
            } else {
                blocked = true;
            }
        }

        let birth_due = if agent.is_pregnant() {
            agent.ready_to_give_birth()
        } else {
            self.try_asex_breed(agent);
            false
        };

        let origin = agent.position();
        if !blocked {
            self.environment
                .move_agent(origin.location, dest, agent.id())?;
            agent.set_position(LocationDirection::new(dest, origin.direction));
        }

        if birth_due {
            let spot = if blocked {
                self.environment
                    .first_empty_facing(origin.location, origin.direction)
            } else {
                Some(origin.location)
            };
            if let Some(spot) = spot {
                self.give_birth(agent, LocationDirection::new(spot, origin.direction))?;
            }
        }

        if waste_due {
            self.drop_waste(agent)?;
        }

        agent.spend_energy(agent.params().step_energy, EnergyCause::StepForward);
        Ok(())
    }

    fn turn(&mut self, agent: &mut Agent, left: bool) {
        let topology = self.environment.topology();
        let (position, cost, cause) = if left {
            (
                topology.get_turn_left_position(agent.position()),
                agent.params().turn_left_energy,
                EnergyCause::TurnLeft,
            )
        } else {
            (
                topology.get_turn_right_position(agent.position()),
                agent.params().turn_right_energy,
                EnergyCause::TurnRight,
            )
        };
        agent.set_position(position);
        agent.spend_energy(cost, cause);
        if !agent.is_pregnant() {
            self.try_asex_breed(agent);
        }
    }

    fn try_asex_breed(&mut self, agent: &mut Agent) {
        let params = agent.params();
        let chance = params.asexual_breed_chance;
        if agent.should_reproduce_asex()
            && agent.enough_energy(params.breed_energy)
            && chance > 0.0
            && roll(&mut self.rng, chance)
        {
            let period = params.asex_pregnancy_period;
            agent.conceive(period, None);
            debug!(tick = self.time(), agent_id = %agent.id(), period, "Asexual conception");
        }
    }

    fn bump_agent(&mut self, agent: &mut Agent, other_id: AgentId) -> Result<(), TickError> {
        let now = self.time();
        let Some(other) = self.agents.get_mut(&other_id) else {
            return Err(TickError::agent(
                agent.id(),
                AgentError::AgentNotFound(other_id),
            ));
        };

        let mut ctx = MutatorContext {
            time: now,
            rng: &mut self.rng,
            environment: &mut self.environment,
        };
        self.mutators
            .on_contact(agent, other, &mut ctx)
            .map_err(TickError::mutator)?;

        // Contact hooks may drain either side. The bumpee may already have
        // acted this tick, so it dies here; a drained bumper is killed by
        // `after_action`.
        if other.energy() <= 0 {
            self.kill_bumpee(agent, other_id, DeathCause::Starvation)?;
        }
        if agent.energy() <= 0 {
            return Ok(());
        }
        agent.spend_energy(agent.params().step_agent_energy, EnergyCause::BumpAgent);
        let Some(other) = self.agents.get_mut(&other_id) else {
            return Ok(());
        };

        if agent.params().food_web.eats_agent(other.agent_type())
            && !agent.enough_energy(agent.params().breed_energy)
        {
            let gain =
                truncate_to_i32(f64::from(other.energy()) * agent.params().agent_food_energy);
            agent.change_energy(gain, EnergyCause::EatAgent);
            debug!(tick = now, agent_id = %agent.id(), victim = %other_id, gain, "Agent eaten");
            return self.kill_bumpee(agent, other_id, DeathCause::Eaten);
        }

        if other.agent_type() != agent.agent_type() {
            return Ok(());
        }

        let params = agent.params();
        let chance = params.sexual_breed_chance;
        let can_breed = !agent.is_pregnant()
            && agent.enough_energy(params.breed_energy)
            && chance > 0.0
            && roll(&mut self.rng, chance);

        let similarity = genome_similarity(agent.controller(), other.controller());
        if similarity >= params.comm_sim_min {
            other.set_comm_inbox(agent.comm_outbox());
        }

        let period = params.sexual_pregnancy_period;
        if can_breed
            && similarity >= params.breed_sim_min
            && agent.is_agent_good(other_id)
            && other.is_agent_good(agent.id())
        {
            agent.conceive(period, Some(other_id));
            debug!(tick = now, agent_id = %agent.id(), partner = %other_id, period, "Sexual conception");
            if agent.params().broadcast_on_breed && agent.can_broadcast() {
                let location = agent.location();
                self.broadcast(agent, PacketKind::Breed { location });
            }
        }
        Ok(())
    }

    /// Kill the agent that `agent` bumped into. The bumper is checked out of
    /// the map, so `die` cannot reach it and its partner link is cleared here.
    fn kill_bumpee(
        &mut self,
        agent: &mut Agent,
        other_id: AgentId,
        cause: DeathCause,
    ) -> Result<(), TickError> {
        if let Some(mut victim) = self.agents.remove(&other_id) {
            self.die(&mut victim, cause)?;
        }
        agent.clear_partner(other_id);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Broadcast
    // -----------------------------------------------------------------------

    fn broadcast(&mut self, agent: &mut Agent, kind: PacketKind) {
        let packet = BroadcastPacket {
            id: self.packet_ids.next_packet(),
            sender: agent.id(),
            origin: agent.location(),
            range: agent.params().broadcast_range,
            kind,
            created_at: self.time(),
        };
        self.environment.conduit_mut().add_packet(packet);
        agent.spend_energy(agent.params().broadcast_energy_cost, EnergyCause::Broadcast);
    }

    fn receive_broadcast(&self, agent: &mut Agent) {
        let topology = self.environment.topology();
        let Some(packet) = self
            .environment
            .conduit()
            .find_packet(topology, agent.location(), agent.id())
            .copied()
        else {
            return;
        };
        if !agent.is_agent_good(packet.sender) {
            return;
        }
        let target = packet.kind.target();
        let closeness = if target == agent.location() {
            1.0
        } else {
            1.0 / topology.get_distance(agent.location(), target)
        };
        agent.set_comm_inbox(closeness);
    }

    // -----------------------------------------------------------------------
    // Birth, waste, death
    // -----------------------------------------------------------------------

    /// Create the parent's child at `spot` and charge the parent for it.
    fn give_birth(&mut self, parent: &mut Agent, spot: LocationDirection) -> Result<(), TickError> {
        let now = self.time();
        let params = self
            .config
            .agent_types
            .get(parent.agent_type().index())
            .cloned()
            .ok_or_else(|| {
                TickError::agent(
                    parent.id(),
                    AgentError::UnknownAgentType {
                        agent_type: parent.agent_type(),
                        configured: self.config.agent_types.len(),
                    },
                )
            })?;

        let partner = parent
            .pregnancy()
            .and_then(|p| p.partner)
            .and_then(|id| self.agents.get(&id));
        let (controller, mode) = match partner {
            Some(partner) => (
                parent
                    .controller()
                    .create_child_sexual(partner.controller(), &mut self.rng),
                ReproductionMode::Sexual,
            ),
            None => (
                parent.controller().create_child_asexual(&mut self.rng),
                ReproductionMode::Asexual,
            ),
        };

        let id = self.agent_ids.next_agent();
        let mut child = Agent::new(id, parent.agent_type(), spot, params, controller, now);
        self.environment.set_agent(spot.location, id)?;
        self.scheduler.add(id);
        child.controller_mut().add_client_agent(id);

        let parents = match partner {
            Some(partner) => Parents::Sexual(parent, partner),
            None => Parents::Asexual(parent),
        };
        let mut ctx = MutatorContext {
            time: now,
            rng: &mut self.rng,
            environment: &mut self.environment,
        };
        self.mutators
            .on_spawn(&mut child, parents, &mut ctx)
            .map_err(TickError::mutator)?;

        self.notify_spawn(&child, mode);
        debug!(
            tick = now,
            agent_id = %id,
            parent = %parent.id(),
            agent_type = %child.agent_type(),
            location = %spot.location,
            mode = ?mode,
            "Agent born"
        );
        self.agents.insert(id, child);
        self.births = self.births.saturating_add(1);

        let cause = match mode {
            ReproductionMode::Sexual => EnergyCause::SexualReproduction,
            ReproductionMode::Asexual | ReproductionMode::Seeded => {
                EnergyCause::AsexualReproduction
            }
        };
        parent.spend_energy(parent.params().init_energy, cause);
        let penalty = parent.energy_penalty(now);
        if penalty > 0 {
            parent.spend_energy(penalty, EnergyCause::AgingPenalty);
        }
        parent.end_pregnancy();
        Ok(())
    }

    /// Leave a waste drop behind the agent, if there is room.
    fn drop_waste(&mut self, agent: &mut Agent) -> Result<(), TickError> {
        let Some(spot) = self
            .environment
            .first_empty_facing(agent.location(), agent.facing().opposite())
        else {
            return Ok(());
        };
        self.environment.add_drop(
            spot,
            Drop::Waste {
                created_at: self.time(),
                lifetime: agent.params().waste_decay,
            },
        )?;
        agent.spend_waste_gain();
        Ok(())
    }

    /// Kill an agent that is not in the agent map.
    ///
    /// The cell is freed and the agent deregistered before death hooks run,
    /// so hooks observe the world without it.
    pub(crate) fn die(&mut self, agent: &mut Agent, cause: DeathCause) -> Result<(), TickError> {
        let now = self.time();
        let id = agent.id();
        agent.mark_dead(cause);
        self.environment.clear_agent(agent.location(), id)?;
        self.scheduler.remove(id);
        agent.controller_mut().remove_client_agent(id);

        let mut ctx = MutatorContext {
            time: now,
            rng: &mut self.rng,
            environment: &mut self.environment,
        };
        self.mutators
            .on_death(agent, &mut ctx)
            .map_err(TickError::mutator)?;
        for listener in &mut self.listeners {
            listener.on_death(agent, cause);
        }

        for other in self.agents.values_mut() {
            other.clear_partner(id);
        }

        self.deaths = self.deaths.saturating_add(1);
        debug!(
            tick = now,
            agent_id = %id,
            agent_type = %agent.agent_type(),
            cause = %cause,
            energy = agent.energy(),
            "Agent died"
        );
        Ok(())
    }
}

/// A stone, waste, the grid edge, or the agent's own cell is in the way.
fn bump_wall(agent: &mut Agent) {
    agent.spend_energy(agent.params().step_rock_energy, EnergyCause::BumpWall);
}
