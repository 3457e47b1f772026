//! The decision-making capability bound to each agent.
//!
//! A [`Controller`] is asked once per agent per tick to choose what the
//! agent does, and is asked for offspring controllers when the agent
//! reproduces. The engine never looks inside a controller; variants differ
//! only in how they pick an action and how they combine parental policy.
//!
//! Controllers do not touch the world directly. They read a
//! [`ControllerInput`] snapshot and return a [`Decision`], which the agent
//! state machine then carries out.

use std::collections::BTreeSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

use habitat_types::{Action, AgentId, AgentType, Direction};
use habitat_world::{Cell, Drop, SimRng};

use crate::genetic::{GeneticController, GeneticParams};

/// What an agent sees in the cell it faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sensed {
    /// An empty cell.
    Nothing,
    /// The grid edge on a bounded topology.
    Edge,
    /// A stone.
    Stone,
    /// Waste.
    Waste,
    /// A product drop.
    Product,
    /// Food of the agent's own type.
    FoodOwn,
    /// Food of another type.
    FoodOther,
    /// Another agent.
    Agent {
        /// Whether it shares the observer's type.
        same_type: bool,
    },
}

impl Sensed {
    /// Classify a cell as seen by an agent of `own_type`.
    ///
    /// `agent_type_of` resolves the type of an agent standing in the cell.
    pub fn classify(
        cell: Option<Cell>,
        own_type: AgentType,
        agent_type_of: impl Fn(AgentId) -> Option<AgentType>,
    ) -> Self {
        match cell {
            None => Self::Edge,
            Some(Cell::Empty) => Self::Nothing,
            Some(Cell::Stone) => Self::Stone,
            Some(Cell::Drop(Drop::Waste { .. })) => Self::Waste,
            Some(Cell::Drop(Drop::Product { .. })) => Self::Product,
            Some(Cell::Food(food_type)) if food_type == own_type.index() => Self::FoodOwn,
            Some(Cell::Food(_)) => Self::FoodOther,
            Some(Cell::Agent(id)) => Self::Agent {
                same_type: agent_type_of(id) == Some(own_type),
            },
        }
    }

    /// Three-bit code used by lookup-table controllers.
    pub const fn code(self) -> u8 {
        match self {
            Self::Nothing => 0,
            Self::Edge => 1,
            Self::Stone => 2,
            Self::Waste => 3,
            Self::Product => 4,
            Self::FoodOwn => 5,
            Self::FoodOther => 6,
            Self::Agent { .. } => 7,
        }
    }
}

/// Read-only snapshot of an agent handed to its controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerInput {
    /// The agent being controlled.
    pub agent: AgentId,
    /// Its type.
    pub agent_type: AgentType,
    /// Current energy.
    pub energy: i32,
    /// The type's breeding threshold, for energy bucketing.
    pub breed_energy: i32,
    /// Current facing.
    pub facing: Direction,
    /// Contents of the faced cell.
    pub ahead: Sensed,
    /// The agent's memory register.
    pub memory: f64,
    /// The message received this tick (0 when none).
    pub comm_inbox: f64,
    /// Ticks since birth.
    pub age: u64,
    /// Whether the agent is pregnant.
    pub pregnant: bool,
}

/// A controller's choice for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    /// What to do.
    pub action: Action,
    /// New memory register value, or `None` to keep it.
    pub memory: Option<f64>,
    /// New outgoing message, or `None` to keep it.
    pub comm_outbox: Option<f64>,
    /// Whether the agent wants to reproduce asexually when it can.
    pub reproduce_asex: bool,
}

impl Decision {
    /// A bare action that leaves memory and messaging untouched.
    pub const fn act(action: Action) -> Self {
        Self {
            action,
            memory: None,
            comm_outbox: None,
            reproduce_asex: false,
        }
    }
}

/// Decision-making capability bound to one or more agents.
pub trait Controller: Send + core::fmt::Debug {
    /// Choose the agent's action for this tick.
    ///
    /// Called exactly once per living agent per tick.
    fn control_agent(&mut self, input: &ControllerInput, rng: &mut SimRng) -> Decision;

    /// Produce the controller for a one-parent child.
    fn create_child_asexual(&self, rng: &mut SimRng) -> Box<dyn Controller>;

    /// Produce the controller for a two-parent child.
    ///
    /// Variants that cannot combine with `partner` fall back to an asexual
    /// copy of `self`.
    fn create_child_sexual(&self, partner: &dyn Controller, rng: &mut SimRng)
    -> Box<dyn Controller>;

    /// An agent started using this controller.
    fn add_client_agent(&mut self, _agent: AgentId) {}

    /// An agent stopped using this controller (it died).
    fn remove_client_agent(&mut self, _agent: AgentId) {}

    /// The encoded policy, for variants that have one.
    fn genome(&self) -> Option<&[u8]> {
        None
    }

    /// Short variant name for logs.
    fn kind(&self) -> &'static str;
}

// ---------------------------------------------------------------------------
// Scripted
// ---------------------------------------------------------------------------

/// Replays a fixed action list, cycling forever.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedController {
    script: Vec<Action>,
    cursor: usize,
    reproduce_asex: bool,
    clients: BTreeSet<AgentId>,
}

impl ScriptedController {
    /// Create a controller replaying `script`. An empty script rests.
    pub const fn new(script: Vec<Action>, reproduce_asex: bool) -> Self {
        Self {
            script,
            cursor: 0,
            reproduce_asex,
            clients: BTreeSet::new(),
        }
    }

    /// Agents currently registered with this controller.
    pub const fn clients(&self) -> &BTreeSet<AgentId> {
        &self.clients
    }

    fn fresh_copy(&self) -> Self {
        Self::new(self.script.clone(), self.reproduce_asex)
    }
}

impl Controller for ScriptedController {
    fn control_agent(&mut self, _input: &ControllerInput, _rng: &mut SimRng) -> Decision {
        let action = self.script.get(self.cursor).copied().unwrap_or(Action::Rest);
        self.cursor = self
            .cursor
            .saturating_add(1)
            .checked_rem(self.script.len())
            .unwrap_or(0);
        Decision {
            reproduce_asex: self.reproduce_asex,
            ..Decision::act(action)
        }
    }

    fn create_child_asexual(&self, _rng: &mut SimRng) -> Box<dyn Controller> {
        Box::new(self.fresh_copy())
    }

    fn create_child_sexual(
        &self,
        _partner: &dyn Controller,
        _rng: &mut SimRng,
    ) -> Box<dyn Controller> {
        Box::new(self.fresh_copy())
    }

    fn add_client_agent(&mut self, agent: AgentId) {
        self.clients.insert(agent);
    }

    fn remove_client_agent(&mut self, agent: AgentId) {
        self.clients.remove(&agent);
    }

    fn kind(&self) -> &'static str {
        "scripted"
    }
}

// ---------------------------------------------------------------------------
// Random
// ---------------------------------------------------------------------------

/// Picks uniformly among stepping and turning every tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RandomController;

const RANDOM_ACTIONS: [Action; 3] = [Action::StepForward, Action::TurnLeft, Action::TurnRight];

impl Controller for RandomController {
    fn control_agent(&mut self, _input: &ControllerInput, rng: &mut SimRng) -> Decision {
        let pick: usize = rng.random_range(0..RANDOM_ACTIONS.len());
        Decision::act(RANDOM_ACTIONS.get(pick).copied().unwrap_or(Action::Rest))
    }

    fn create_child_asexual(&self, _rng: &mut SimRng) -> Box<dyn Controller> {
        Box::new(Self)
    }

    fn create_child_sexual(
        &self,
        _partner: &dyn Controller,
        _rng: &mut SimRng,
    ) -> Box<dyn Controller> {
        Box::new(Self)
    }

    fn kind(&self) -> &'static str {
        "random"
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Which controller variant seeded agents get.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ControllerParams {
    /// [`ScriptedController`].
    Scripted {
        /// Actions replayed in order.
        #[serde(default)]
        script: Vec<Action>,
        /// Whether scripted agents reproduce asexually when they can.
        #[serde(default)]
        reproduce_asex: bool,
    },
    /// [`RandomController`].
    Random,
    /// [`GeneticController`].
    Genetic(GeneticParams),
}

impl Default for ControllerParams {
    fn default() -> Self {
        Self::Genetic(GeneticParams::default())
    }
}

impl ControllerParams {
    /// Build a controller for a seeded agent.
    pub fn build(&self, rng: &mut SimRng) -> Box<dyn Controller> {
        match self {
            Self::Scripted {
                script,
                reproduce_asex,
            } => Box::new(ScriptedController::new(script.clone(), *reproduce_asex)),
            Self::Random => Box::new(RandomController),
            Self::Genetic(params) => Box::new(GeneticController::random(params, rng)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use habitat_world::rng::seeded;

    fn input() -> ControllerInput {
        ControllerInput {
            agent: AgentId(1),
            agent_type: AgentType(0),
            energy: 50,
            breed_energy: 60,
            facing: Direction::North,
            ahead: Sensed::Nothing,
            memory: 0.0,
            comm_inbox: 0.0,
            age: 0,
            pregnant: false,
        }
    }

    #[test]
    fn scripted_cycles() {
        let mut rng = seeded(1);
        let mut c = ScriptedController::new(vec![Action::StepForward, Action::TurnLeft], false);
        let actions: Vec<Action> = (0..5)
            .map(|_| c.control_agent(&input(), &mut rng).action)
            .collect();
        assert_eq!(
            actions,
            vec![
                Action::StepForward,
                Action::TurnLeft,
                Action::StepForward,
                Action::TurnLeft,
                Action::StepForward
            ]
        );
    }

    #[test]
    fn empty_script_rests() {
        let mut rng = seeded(1);
        let mut c = ScriptedController::new(Vec::new(), false);
        assert_eq!(c.control_agent(&input(), &mut rng).action, Action::Rest);
    }

    #[test]
    fn scripted_tracks_clients() {
        let mut c = ScriptedController::new(vec![Action::Rest], false);
        c.add_client_agent(AgentId(3));
        c.add_client_agent(AgentId(4));
        c.remove_client_agent(AgentId(3));
        assert_eq!(c.clients().len(), 1);
    }

    #[test]
    fn random_never_rests() {
        let mut rng = seeded(2);
        let mut c = RandomController;
        for _ in 0..100 {
            assert_ne!(c.control_agent(&input(), &mut rng).action, Action::Rest);
        }
    }

    #[test]
    fn classify_cells() {
        let own = AgentType(1);
        let lookup = |id: AgentId| (id == AgentId(9)).then_some(AgentType(1));
        assert_eq!(Sensed::classify(None, own, lookup), Sensed::Edge);
        assert_eq!(Sensed::classify(Some(Cell::Food(1)), own, lookup), Sensed::FoodOwn);
        assert_eq!(Sensed::classify(Some(Cell::Food(0)), own, lookup), Sensed::FoodOther);
        assert_eq!(
            Sensed::classify(Some(Cell::Agent(AgentId(9))), own, lookup),
            Sensed::Agent { same_type: true }
        );
        assert_eq!(
            Sensed::classify(Some(Cell::Agent(AgentId(2))), own, lookup),
            Sensed::Agent { same_type: false }
        );
    }

    #[test]
    fn controller_params_yaml() {
        let params: ControllerParams =
            serde_yml::from_str("kind: scripted\nscript: [step_forward, rest]\n").unwrap();
        assert_eq!(
            params,
            ControllerParams::Scripted {
                script: vec![Action::StepForward, Action::Rest],
                reproduce_asex: false,
            }
        );
        let random: ControllerParams = serde_yml::from_str("kind: random\n").unwrap();
        assert_eq!(random, ControllerParams::Random);
    }
}
