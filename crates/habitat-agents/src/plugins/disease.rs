//! Contagious disease.
//!
//! A sick agent has one of its parameters scaled by the type's `factor`
//! until it recovers, is healed, or dies. Disease spreads on contact and
//! from sick parents to children. Vaccinators and healers act on the agents
//! they bump. Vaccination is checked before transmission inside this one
//! mutator, so no ordering with other mutators is assumed.
//!
//! Agents may wear protective equipment (PPE), handed out at spawn. PPE on
//! either side of a contact can stop the transmission, once per wearer, with
//! the wearer type's `ppe_effectiveness`. An agent infected by contact
//! remembers its infector as a bad agent.

use std::any::Any;
use std::collections::BTreeMap;

use rand::Rng;
use tracing::debug;

use habitat_types::{AgentId, AgentType};
use habitat_world::{Environment, SimRng};
use habitat_world::rng::roll;

use crate::agent::Agent;
use crate::config::DiseaseParams;
use crate::error::AgentError;
use crate::mutator::{
    ContactMutator, DeathMutator, LoggingMutator, Mutator, MutatorContext, Parents, SpawnMutator,
    UpdateMutator,
};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct DiseaseState {
    sick: bool,
    vaccinated: bool,
    vaccine_effectiveness: f64,
    wearing_ppe: bool,
    ppe_effectiveness: f64,
    sick_start: u64,
    /// Parameter value before the disease scaled it.
    original_value: Option<f64>,
}

impl DiseaseState {
    /// What survives the end of an illness.
    const fn cured(self, keep_vaccination: bool) -> Self {
        Self {
            sick: false,
            vaccinated: self.vaccinated && keep_vaccination,
            vaccine_effectiveness: self.vaccine_effectiveness,
            wearing_ppe: self.wearing_ppe,
            ppe_effectiveness: self.ppe_effectiveness,
            sick_start: 0,
            original_value: None,
        }
    }

    /// Whether the state still records anything.
    const fn is_blank(&self) -> bool {
        !self.sick && !self.vaccinated && !self.wearing_ppe
    }

    /// A PPE roll for this wearer; consumes no draw when unprotected.
    fn ppe_blocks(&self, rng: &mut SimRng) -> bool {
        self.wearing_ppe && roll(rng, self.ppe_effectiveness)
    }
}

/// Disease spread, vaccination, healing, and recovery.
#[derive(Debug)]
pub struct DiseaseMutator {
    params: Vec<DiseaseParams>,
    states: BTreeMap<AgentId, DiseaseState>,
    sick_count: Vec<u64>,
}

fn flag(row: &[bool], index: usize) -> bool {
    row.get(index).copied().unwrap_or(false)
}

impl DiseaseMutator {
    /// Create the mutator with one parameter set per agent type.
    pub fn new(params: Vec<DiseaseParams>) -> Self {
        let sick_count = vec![0; params.len()];
        Self {
            params,
            states: BTreeMap::new(),
            sick_count,
        }
    }

    /// Whether the agent is currently sick.
    pub fn is_sick(&self, agent: AgentId) -> bool {
        self.states.get(&agent).is_some_and(|s| s.sick)
    }

    /// Whether the agent is vaccinated.
    pub fn is_vaccinated(&self, agent: AgentId) -> bool {
        self.states.get(&agent).is_some_and(|s| s.vaccinated)
    }

    /// Whether the agent wears protective equipment.
    pub fn is_wearing_ppe(&self, agent: AgentId) -> bool {
        self.states.get(&agent).is_some_and(|s| s.wearing_ppe)
    }

    /// Number of agents with disease state attached.
    pub fn tracked_agents(&self) -> usize {
        self.states.len()
    }

    /// Sick agents of one type.
    pub fn sick_count(&self, agent_type: AgentType) -> u64 {
        self.sick_count.get(agent_type.index()).copied().unwrap_or(0)
    }

    fn params_for(&self, agent_type: AgentType) -> Result<&DiseaseParams, AgentError> {
        self.params
            .get(agent_type.index())
            .ok_or(AgentError::UnknownAgentType {
                agent_type,
                configured: self.params.len(),
            })
    }

    fn adjust_count(&mut self, agent_type: AgentType, sick: bool) {
        if let Some(count) = self.sick_count.get_mut(agent_type.index()) {
            *count = if sick {
                count.saturating_add(1)
            } else {
                count.saturating_sub(1)
            };
        }
    }

    /// Make `agent` sick, keeping any vaccination record.
    fn infect(&mut self, agent: &mut Agent, now: u64) -> Result<(), AgentError> {
        let params = self.params_for(agent.agent_type())?;
        let (parameter, factor) = (params.parameter, params.factor);
        let original_value = parameter.get(agent.params());
        if let Some(value) = original_value {
            parameter.set(agent.params_mut(), value * factor);
        }
        let previous = self.states.get(&agent.id()).copied().unwrap_or_default();
        self.states.insert(
            agent.id(),
            DiseaseState {
                sick: true,
                sick_start: now,
                original_value,
                ..previous
            },
        );
        self.adjust_count(agent.agent_type(), true);
        debug!(agent_id = %agent.id(), tick = now, "Agent infected");
        Ok(())
    }

    fn restore_parameter(&self, agent: &mut Agent, state: &DiseaseState) -> Result<(), AgentError> {
        let parameter = self.params_for(agent.agent_type())?.parameter;
        if let Some(value) = state.original_value {
            parameter.set(agent.params_mut(), value);
        }
        Ok(())
    }

    /// End an illness and restore the parameter. Recovery loses the
    /// vaccination, healing keeps it; PPE is kept either way.
    fn cure(&mut self, agent: &mut Agent, keep_vaccination: bool) -> Result<(), AgentError> {
        let Some(state) = self.states.remove(&agent.id()) else {
            return Ok(());
        };
        self.restore_parameter(agent, &state)?;
        if state.sick {
            self.adjust_count(agent.agent_type(), false);
        }
        let rest = state.cured(keep_vaccination);
        if !rest.is_blank() {
            self.states.insert(agent.id(), rest);
        }
        Ok(())
    }

    fn unsick(&mut self, agent: &mut Agent) -> Result<(), AgentError> {
        self.cure(agent, false)
    }

    fn heal(&mut self, agent: &mut Agent) -> Result<(), AgentError> {
        self.cure(agent, true)
    }

    fn vaccinate(&mut self, agent: &Agent, effectiveness: f64) {
        let state = self.states.entry(agent.id()).or_default();
        state.vaccinated = true;
        state.vaccine_effectiveness = effectiveness;
    }

    fn equip_ppe(&mut self, agent: &Agent, effectiveness: f64) {
        let state = self.states.entry(agent.id()).or_default();
        state.wearing_ppe = true;
        state.ppe_effectiveness = effectiveness;
    }

    /// Returns whether the agent was infected.
    fn infect_with_chance(
        &mut self,
        agent: &mut Agent,
        chance: f64,
        ctx: &mut MutatorContext<'_>,
    ) -> Result<bool, AgentError> {
        if !roll(ctx.rng, chance) {
            return Ok(false);
        }
        self.infect(agent, ctx.time)?;
        Ok(true)
    }

    fn transmit_one_way(
        &mut self,
        bumper: &mut Agent,
        bumpee: &mut Agent,
        ctx: &mut MutatorContext<'_>,
    ) -> Result<(), AgentError> {
        let target = bumpee.agent_type().index();
        let source = self.params_for(bumper.agent_type())?;
        let vaccinates = source.vaccinator && flag(&source.can_vaccinate, target);
        let vaccine_effectiveness = source.vaccine_effectiveness;
        let heals = source.healer && flag(&source.can_heal, target);
        let healer_effectiveness = source.healer_effectiveness;
        let transmits = flag(&source.transmit_to, target);

        if vaccinates && !self.is_sick(bumpee.id()) {
            self.vaccinate(bumpee, vaccine_effectiveness);
        }

        if heals && self.is_sick(bumpee.id()) && roll(ctx.rng, healer_effectiveness) {
            self.heal(bumpee)?;
        }

        let Some(source_state) = self.states.get(&bumper.id()).copied() else {
            return Ok(());
        };
        if !source_state.sick || source_state.ppe_blocks(ctx.rng) {
            return Ok(());
        }

        if let Some(state) = self.states.get(&bumpee.id()).copied() {
            if state.vaccinated && roll(ctx.rng, state.vaccine_effectiveness) {
                return Ok(());
            }
            if state.ppe_blocks(ctx.rng) || state.sick {
                return Ok(());
            }
        }

        if transmits {
            let rate = self.params_for(bumpee.agent_type())?.contact_transmit_rate;
            if self.infect_with_chance(bumpee, rate, ctx)? {
                bumpee.remember_bad_agent(bumper.id());
            }
        }
        Ok(())
    }
}

impl SpawnMutator for DiseaseMutator {
    fn on_spawn(
        &mut self,
        agent: &mut Agent,
        parents: Parents<'_>,
        ctx: &mut MutatorContext<'_>,
    ) -> Result<(), AgentError> {
        let params = self.params_for(agent.agent_type())?;
        let (vaccination, infection, child_rate, effectiveness) = (
            params.initial_vaccination,
            params.initial_infection,
            params.child_transmit_rate,
            params.vaccine_effectiveness,
        );
        let (ppe_chance, ppe_effectiveness) = (params.ppe_chance, params.ppe_effectiveness);
        if ppe_chance > 0.0 && roll(ctx.rng, ppe_chance) {
            self.equip_ppe(agent, ppe_effectiveness);
        }
        if let Parents::Seeded = parents {
            if roll(ctx.rng, vaccination) {
                self.vaccinate(agent, effectiveness);
                return Ok(());
            }
            self.infect_with_chance(agent, infection, ctx)?;
            return Ok(());
        }
        let inherited = parents.any_alive(|parent| self.is_sick(parent.id()));
        let chance = if inherited { child_rate } else { 0.0 };
        self.infect_with_chance(agent, chance, ctx)?;
        Ok(())
    }
}

impl ContactMutator for DiseaseMutator {
    fn on_contact(
        &mut self,
        bumper: &mut Agent,
        bumpee: &mut Agent,
        ctx: &mut MutatorContext<'_>,
    ) -> Result<(), AgentError> {
        self.transmit_one_way(bumper, bumpee, ctx)?;
        self.transmit_one_way(bumpee, bumper, ctx)
    }
}

impl UpdateMutator for DiseaseMutator {
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn on_update(&mut self, agent: &mut Agent, ctx: &mut MutatorContext<'_>) -> Result<(), AgentError> {
        let Some(state) = self.states.get(&agent.id()).copied() else {
            return Ok(());
        };
        let recovery_time = self.params_for(agent.agent_type())?.recovery_time;
        if recovery_time == 0 {
            return Ok(());
        }
        let jitter = ctx.rng.random::<f64>().mul_add(0.2, 1.0);
        let random_recovery = (recovery_time as f64 * jitter) as u64;
        if state.sick && ctx.time.saturating_sub(state.sick_start) > random_recovery {
            self.unsick(agent)?;
            debug!(agent_id = %agent.id(), tick = ctx.time, "Agent recovered");
        }
        Ok(())
    }
}

impl DeathMutator for DiseaseMutator {
    fn on_death(&mut self, agent: &Agent, _ctx: &mut MutatorContext<'_>) -> Result<(), AgentError> {
        if let Some(state) = self.states.remove(&agent.id()) {
            if state.sick {
                self.adjust_count(agent.agent_type(), false);
            }
        }
        Ok(())
    }
}

impl LoggingMutator for DiseaseMutator {
    fn log_columns(&self, agent_type: AgentType, _environment: &Environment) -> Vec<(&'static str, i64)> {
        let sick = i64::try_from(self.sick_count(agent_type)).unwrap_or(i64::MAX);
        vec![("sick", sick)]
    }
}

impl Mutator for DiseaseMutator {
    fn name(&self) -> &'static str {
        "disease"
    }

    fn as_spawn(&mut self) -> Option<&mut dyn SpawnMutator> {
        Some(self)
    }

    fn as_contact(&mut self) -> Option<&mut dyn ContactMutator> {
        Some(self)
    }

    fn as_update(&mut self) -> Option<&mut dyn UpdateMutator> {
        Some(self)
    }

    fn as_death(&mut self) -> Option<&mut dyn DeathMutator> {
        Some(self)
    }

    fn as_logging(&self) -> Option<&dyn LoggingMutator> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
