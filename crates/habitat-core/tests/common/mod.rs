//! Shared builders for the integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use habitat_agents::{
    AgentParams, Controller, ControllerInput, ControllerParams, Decision, ScriptedController,
};
use habitat_core::{Simulation, SimulationConfig};
use habitat_types::{Action, AgentId, AgentType, Direction, Location, LocationDirection};
use habitat_world::{FoodParams, SimRng};

/// A grid with no seeded agents, no food, and resting controllers.
pub fn empty_config(width: u32, height: u32, wrap: bool) -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.world.tick_interval_ms = 0;
    config.topology.width = width;
    config.topology.height = height;
    config.topology.wrap = wrap;
    config.agent_types = vec![params()];
    config.food_types = Vec::new();
    config.controller = ControllerParams::Scripted {
        script: vec![Action::Rest],
        reproduce_asex: false,
    };
    config
}

/// Default agent parameters with nothing seeded.
pub fn params() -> AgentParams {
    AgentParams {
        initial_agents: 0,
        ..AgentParams::default()
    }
}

/// A food type that neither seeds nor grows.
pub fn still_food() -> FoodParams {
    FoodParams {
        initial_food: 0,
        grow_chance: 0.0,
        drop_rate: 0.0,
    }
}

pub fn script(actions: &[Action]) -> Box<dyn Controller> {
    Box::new(ScriptedController::new(actions.to_vec(), false))
}

pub fn place(
    sim: &mut Simulation,
    agent_type: usize,
    (x, y): (u32, u32),
    facing: Direction,
    controller: Box<dyn Controller>,
) -> AgentId {
    sim.spawn(
        AgentType(agent_type),
        LocationDirection::new(Location::new(x, y), facing),
        controller,
    )
    .unwrap()
}

/// What a [`RecordingController`] saw when it was asked to decide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Seen {
    pub agent: AgentId,
    pub energy: i32,
    pub comm_inbox: f64,
}

/// Repeats one action and logs every call, sharing the log with its
/// offspring.
#[derive(Debug, Clone)]
pub struct RecordingController {
    action: Action,
    reproduce_asex: bool,
    log: Arc<Mutex<Vec<Seen>>>,
}

impl RecordingController {
    pub fn new(action: Action, reproduce_asex: bool) -> Self {
        Self {
            action,
            reproduce_asex,
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn log(&self) -> Arc<Mutex<Vec<Seen>>> {
        Arc::clone(&self.log)
    }

    pub fn boxed(&self) -> Box<dyn Controller> {
        Box::new(self.clone())
    }
}

pub fn drain(log: &Arc<Mutex<Vec<Seen>>>) -> Vec<Seen> {
    std::mem::take(&mut *log.lock().unwrap())
}

impl Controller for RecordingController {
    fn control_agent(&mut self, input: &ControllerInput, _rng: &mut SimRng) -> Decision {
        self.log.lock().unwrap().push(Seen {
            agent: input.agent,
            energy: input.energy,
            comm_inbox: input.comm_inbox,
        });
        Decision {
            reproduce_asex: self.reproduce_asex,
            ..Decision::act(self.action)
        }
    }

    fn create_child_asexual(&self, _rng: &mut SimRng) -> Box<dyn Controller> {
        self.boxed()
    }

    fn create_child_sexual(
        &self,
        _partner: &dyn Controller,
        _rng: &mut SimRng,
    ) -> Box<dyn Controller> {
        self.boxed()
    }

    fn kind(&self) -> &'static str {
        "recording"
    }
}
