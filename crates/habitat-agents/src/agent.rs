//! The agent record.
//!
//! An [`Agent`] owns its identity, position, energy, cloned type
//! parameters, controller, pregnancy state, message registers, and an
//! [`ExtensionBag`] for mutator-attached state. It knows nothing about the
//! grid or other agents; the state machine in the core crate drives it.

use std::collections::VecDeque;

use tracing::trace;

use habitat_types::{AgentId, AgentType, DeathCause, Direction, EnergyCause, Location};
use habitat_types::LocationDirection;

use crate::config::{AgentParams, truncate_to_i32};
use crate::controller::Controller;
use crate::extension::ExtensionBag;

/// A pending pregnancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pregnancy {
    /// Actions left before the child can be born.
    pub remaining: u32,
    /// The other parent, for sexual conception. Cleared if it dies.
    pub partner: Option<AgentId>,
}

/// One simulated organism.
#[derive(Debug)]
pub struct Agent {
    id: AgentId,
    agent_type: AgentType,
    position: LocationDirection,
    energy: i32,
    birth_tick: u64,
    params: AgentParams,
    controller: Box<dyn Controller>,
    pregnancy: Option<Pregnancy>,
    should_reproduce_asex: bool,
    comm_inbox: f64,
    comm_outbox: f64,
    memory: f64,
    bad_agent_memory: VecDeque<AgentId>,
    waste_gain: i32,
    death: Option<DeathCause>,
    extensions: ExtensionBag,
}

impl Agent {
    /// Create a living agent with `params.init_energy` energy.
    pub fn new(
        id: AgentId,
        agent_type: AgentType,
        position: LocationDirection,
        params: AgentParams,
        controller: Box<dyn Controller>,
        birth_tick: u64,
    ) -> Self {
        Self {
            id,
            agent_type,
            position,
            energy: params.init_energy,
            birth_tick,
            bad_agent_memory: VecDeque::with_capacity(params.pd_memory),
            params,
            controller,
            pregnancy: None,
            should_reproduce_asex: false,
            comm_inbox: 0.0,
            comm_outbox: 0.0,
            memory: 0.0,
            waste_gain: 0,
            death: None,
            extensions: ExtensionBag::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Identity and position
    // -----------------------------------------------------------------------

    /// Unique identity.
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// Agent type.
    pub const fn agent_type(&self) -> AgentType {
        self.agent_type
    }

    /// Cell and facing.
    pub const fn position(&self) -> LocationDirection {
        self.position
    }

    /// Cell.
    pub const fn location(&self) -> Location {
        self.position.location
    }

    /// Facing.
    pub const fn facing(&self) -> Direction {
        self.position.direction
    }

    /// Update the cached position. The grid must already agree.
    pub const fn set_position(&mut self, position: LocationDirection) {
        self.position = position;
    }

    /// Tick of birth.
    pub const fn birth_tick(&self) -> u64 {
        self.birth_tick
    }

    /// Ticks since birth.
    pub const fn age(&self, now: u64) -> u64 {
        now.saturating_sub(self.birth_tick)
    }

    // -----------------------------------------------------------------------
    // Parameters and controller
    // -----------------------------------------------------------------------

    /// This agent's private copy of its type parameters.
    pub const fn params(&self) -> &AgentParams {
        &self.params
    }

    /// Mutable access for mutators that scale parameters.
    pub const fn params_mut(&mut self) -> &mut AgentParams {
        &mut self.params
    }

    /// The controller.
    pub fn controller(&self) -> &dyn Controller {
        self.controller.as_ref()
    }

    /// The controller, mutably.
    pub fn controller_mut(&mut self) -> &mut dyn Controller {
        self.controller.as_mut()
    }

    // -----------------------------------------------------------------------
    // Life and energy
    // -----------------------------------------------------------------------

    /// Whether the agent is alive.
    pub const fn is_alive(&self) -> bool {
        self.death.is_none()
    }

    /// Why the agent died, if it has.
    pub const fn death_cause(&self) -> Option<DeathCause> {
        self.death
    }

    /// Mark the agent dead. The first cause recorded wins.
    pub const fn mark_dead(&mut self, cause: DeathCause) {
        if self.death.is_none() {
            self.death = Some(cause);
        }
    }

    /// Current energy.
    pub const fn energy(&self) -> i32 {
        self.energy
    }

    /// Add `delta` to energy (saturating) and return the new balance.
    pub fn change_energy(&mut self, delta: i32, cause: EnergyCause) -> i32 {
        self.energy = self.energy.saturating_add(delta);
        trace!(
            agent_id = %self.id,
            delta,
            energy = self.energy,
            cause = ?cause,
            "Energy changed"
        );
        self.energy
    }

    /// Pay `cost` energy. Negative costs are gains.
    pub fn spend_energy(&mut self, cost: i32, cause: EnergyCause) -> i32 {
        self.change_energy(cost.saturating_neg(), cause)
    }

    /// `energy >= threshold`.
    pub const fn enough_energy(&self, threshold: i32) -> bool {
        self.energy >= threshold
    }

    /// Age-based energy penalty for the current tick.
    ///
    /// `min(max(0, energy), trunc(aging_rate * tan(age / aging_limit * 89.99 deg)))`,
    /// or 0 when aging is off.
    #[allow(clippy::cast_precision_loss)]
    pub fn energy_penalty(&self, now: u64) -> i32 {
        if !self.params.aging_mode || self.params.aging_limit == 0 {
            return 0;
        }
        let age = self.age(now) as f64;
        let limit = self.params.aging_limit as f64;
        let radians = age / limit * 89.99 * std::f64::consts::PI / 180.0;
        let raw = truncate_to_i32(self.params.aging_rate * radians.tan());
        raw.min(self.energy.max(0))
    }

    // -----------------------------------------------------------------------
    // Pregnancy
    // -----------------------------------------------------------------------

    /// Current pregnancy, if any.
    pub const fn pregnancy(&self) -> Option<Pregnancy> {
        self.pregnancy
    }

    /// Whether the agent is pregnant.
    pub const fn is_pregnant(&self) -> bool {
        self.pregnancy.is_some()
    }

    /// Start a pregnancy lasting `period` actions.
    pub const fn conceive(&mut self, period: u32, partner: Option<AgentId>) {
        self.pregnancy = Some(Pregnancy {
            remaining: period,
            partner,
        });
    }

    /// End the pregnancy without a birth (or after one).
    pub const fn end_pregnancy(&mut self) {
        self.pregnancy = None;
    }

    /// Count one action off the pregnancy.
    pub const fn advance_pregnancy(&mut self) {
        if let Some(pregnancy) = self.pregnancy.as_mut() {
            pregnancy.remaining = pregnancy.remaining.saturating_sub(1);
        }
    }

    /// Pregnant, countdown finished, and still above the breeding threshold.
    pub const fn ready_to_give_birth(&self) -> bool {
        match self.pregnancy {
            Some(p) => p.remaining == 0 && self.enough_energy(self.params.breed_energy),
            None => false,
        }
    }

    /// Forget a breeding partner that is no longer valid.
    pub fn clear_partner(&mut self, partner: AgentId) {
        if let Some(p) = self.pregnancy.as_mut() {
            if p.partner == Some(partner) {
                p.partner = None;
            }
        }
    }

    /// Whether the controller currently asks for asexual reproduction.
    pub const fn should_reproduce_asex(&self) -> bool {
        self.should_reproduce_asex
    }

    /// Set the asexual reproduction intent.
    pub const fn set_should_reproduce_asex(&mut self, flag: bool) {
        self.should_reproduce_asex = flag;
    }

    // -----------------------------------------------------------------------
    // Messaging and memory
    // -----------------------------------------------------------------------

    /// Message received this tick.
    pub const fn comm_inbox(&self) -> f64 {
        self.comm_inbox
    }

    /// Deliver a message.
    pub const fn set_comm_inbox(&mut self, value: f64) {
        self.comm_inbox = value;
    }

    /// Drop this tick's message.
    pub const fn clear_comm_inbox(&mut self) {
        self.comm_inbox = 0.0;
    }

    /// Message this agent passes to similar agents it bumps.
    pub const fn comm_outbox(&self) -> f64 {
        self.comm_outbox
    }

    /// Set the outgoing message.
    pub const fn set_comm_outbox(&mut self, value: f64) {
        self.comm_outbox = value;
    }

    /// Controller memory register.
    pub const fn memory(&self) -> f64 {
        self.memory
    }

    /// Set the controller memory register.
    pub const fn set_memory(&mut self, value: f64) {
        self.memory = value;
    }

    /// Whether broadcasting is enabled and affordable.
    pub const fn can_broadcast(&self) -> bool {
        self.params.broadcast_mode && self.enough_energy(self.params.broadcast_energy_min)
    }

    /// Remember `other` as untrustworthy, most recent last.
    ///
    /// The memory holds at most `pd_memory` agents; the oldest is forgotten.
    pub fn remember_bad_agent(&mut self, other: AgentId) {
        if other == self.id || self.params.pd_memory == 0 {
            return;
        }
        self.bad_agent_memory.retain(|id| *id != other);
        if self.bad_agent_memory.len() >= self.params.pd_memory {
            self.bad_agent_memory.pop_front();
        }
        self.bad_agent_memory.push_back(other);
    }

    /// Whether `other` is trusted. Checking a remembered agent refreshes it.
    pub fn is_agent_good(&mut self, other: AgentId) -> bool {
        if !self.bad_agent_memory.contains(&other) {
            return true;
        }
        self.remember_bad_agent(other);
        false
    }

    // -----------------------------------------------------------------------
    // Waste
    // -----------------------------------------------------------------------

    /// Record energy gained from food. Returns whether enough has
    /// accumulated to produce a waste drop.
    pub const fn record_food_gain(&mut self, gain: i32) -> bool {
        if !self.params.waste_mode || self.params.waste_gain_limit <= 0 {
            return false;
        }
        self.waste_gain = self.waste_gain.saturating_add(gain);
        self.waste_gain >= self.params.waste_gain_limit
    }

    /// Pay one waste drop out of the accumulated food gain.
    pub const fn spend_waste_gain(&mut self) {
        self.waste_gain = self.waste_gain.saturating_sub(self.params.waste_gain_limit);
    }

    // -----------------------------------------------------------------------
    // Extensions
    // -----------------------------------------------------------------------

    /// Mutator-attached state.
    pub const fn extensions(&self) -> &ExtensionBag {
        &self.extensions
    }

    /// Mutator-attached state, mutably.
    pub const fn extensions_mut(&mut self) -> &mut ExtensionBag {
        &mut self.extensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ScriptedController;

    fn make_agent(params: AgentParams) -> Agent {
        Agent::new(
            AgentId(1),
            AgentType(0),
            LocationDirection::new(Location::new(0, 0), Direction::North),
            params,
            Box::new(ScriptedController::new(Vec::new(), false)),
            10,
        )
    }

    #[test]
    fn starts_with_init_energy() {
        let agent = make_agent(AgentParams::default());
        assert_eq!(agent.energy(), 100);
        assert!(agent.is_alive());
        assert_eq!(agent.age(15), 5);
    }

    #[test]
    fn first_death_cause_wins() {
        let mut agent = make_agent(AgentParams::default());
        agent.mark_dead(DeathCause::Eaten);
        agent.mark_dead(DeathCause::Starvation);
        assert_eq!(agent.death_cause(), Some(DeathCause::Eaten));
        assert!(!agent.is_alive());
    }

    #[test]
    fn no_penalty_without_aging() {
        let agent = make_agent(AgentParams::default());
        assert_eq!(agent.energy_penalty(1000), 0);
    }

    #[test]
    fn penalty_grows_with_age_and_caps_at_energy() {
        let params = AgentParams {
            aging_mode: true,
            aging_limit: 100,
            aging_rate: 10.0,
            ..AgentParams::default()
        };
        let mut agent = make_agent(params);
        let young = agent.energy_penalty(20);
        let old = agent.energy_penalty(100);
        assert!(young <= old);
        // tan(89.99 deg) * 10 is far above the 100 energy balance.
        assert_eq!(agent.energy_penalty(110), 100);
        agent.change_energy(-150, EnergyCause::BumpWall);
        assert_eq!(agent.energy_penalty(110), 0);
    }

    #[test]
    fn pregnancy_countdown() {
        let mut agent = make_agent(AgentParams::default());
        agent.conceive(2, Some(AgentId(7)));
        assert!(!agent.ready_to_give_birth());
        agent.advance_pregnancy();
        agent.advance_pregnancy();
        agent.advance_pregnancy();
        assert!(agent.ready_to_give_birth());
        agent.clear_partner(AgentId(7));
        assert_eq!(agent.pregnancy().and_then(|p| p.partner), None);
        agent.change_energy(-50, EnergyCause::StepForward);
        assert!(!agent.ready_to_give_birth());
    }

    #[test]
    fn bad_agent_memory_is_bounded() {
        let mut agent = make_agent(AgentParams {
            pd_memory: 2,
            ..AgentParams::default()
        });
        agent.remember_bad_agent(AgentId(2));
        agent.remember_bad_agent(AgentId(3));
        agent.remember_bad_agent(AgentId(4));
        assert!(agent.is_agent_good(AgentId(2)));
        assert!(!agent.is_agent_good(AgentId(3)));
        assert!(!agent.is_agent_good(AgentId(4)));
        agent.remember_bad_agent(AgentId(1));
        assert!(agent.is_agent_good(AgentId(1)));
    }

    #[test]
    fn waste_accumulates_only_in_waste_mode() {
        let mut off = make_agent(AgentParams::default());
        assert!(!off.record_food_gain(500));
        let mut on = make_agent(AgentParams {
            waste_mode: true,
            waste_gain_limit: 100,
            ..AgentParams::default()
        });
        assert!(!on.record_food_gain(60));
        assert!(on.record_food_gain(60));
        on.spend_waste_gain();
        assert!(!on.record_food_gain(0));
    }
}
