//! End-to-end scenarios for the agent state machine.
//!
//! Each test builds a small hand-placed world on an empty grid and checks
//! the energy and population after a few ticks.

#![allow(clippy::unwrap_used)]

mod common;

use std::sync::{Arc, Mutex};

use habitat_agents::{
    Agent, AgentError, ContactMutator, Mutator, MutatorContext, UpdateMutator,
};
use habitat_core::{CountingListener, PopulationListener, Simulation, TickError};
use habitat_types::{
    Action, AgentId, AgentType, DeathCause, Direction, EnergyCause, Location, ReproductionMode,
};
use habitat_world::Drop;

use common::{
    RecordingController, drain, empty_config, params, place, script, still_food,
};

/// Records every death cause.
#[derive(Default)]
struct Deaths(Arc<Mutex<Vec<(AgentId, DeathCause)>>>);

impl PopulationListener for Deaths {
    fn on_death(&mut self, agent: &Agent, cause: DeathCause) {
        self.0.lock().unwrap().push((agent.id(), cause));
    }
}

/// Records how each agent came to be.
struct Modes(Arc<Mutex<Vec<ReproductionMode>>>);

impl PopulationListener for Modes {
    fn on_spawn(&mut self, _agent: &Agent, mode: ReproductionMode) {
        self.0.lock().unwrap().push(mode);
    }
}

fn loc(x: u32, y: u32) -> Location {
    Location::new(x, y)
}

#[test]
fn fifty_steps_without_food_cost_fifty_energy() {
    let mut config = empty_config(10, 10, true);
    config.agent_types = vec![habitat_agents::AgentParams {
        init_energy: 100,
        step_energy: 1,
        breed_energy: 50,
        aging_mode: false,
        ..params()
    }];
    let mut sim = Simulation::new(config).unwrap();
    let id = place(&mut sim, 0, (0, 0), Direction::East, script(&[Action::StepForward]));

    for _ in 0..50 {
        sim.tick().unwrap();
    }

    let agent = sim.agent(id).unwrap();
    assert!(agent.is_alive());
    assert_eq!(agent.energy(), 50);
    assert_eq!(sim.population(), 1);
    assert_eq!(sim.time(), 50);
}

#[test]
fn sexual_breeding_adds_exactly_one_child() {
    let mut config = empty_config(10, 10, true);
    config.agent_types = vec![habitat_agents::AgentParams {
        init_energy: 100,
        breed_energy: 50,
        sexual_breed_chance: 1.0,
        sexual_pregnancy_period: 2,
        ..params()
    }];
    let mut sim = Simulation::new(config).unwrap();
    let counting = CountingListener::new();
    let counts = counting.counts();
    sim.add_listener(Box::new(counting));

    let a = place(
        &mut sim,
        0,
        (1, 1),
        Direction::East,
        script(&[Action::StepForward, Action::TurnLeft, Action::StepForward]),
    );
    let b = place(&mut sim, 0, (2, 1), Direction::West, script(&[Action::Rest]));
    sim.agent_mut(a)
        .unwrap()
        .change_energy(100, EnergyCause::Plugin);

    // Tick 1: a bumps b and conceives with b as partner.
    sim.tick().unwrap();
    let pregnancy = sim.agent(a).unwrap().pregnancy().unwrap();
    assert_eq!(pregnancy.partner, Some(b));
    assert_eq!(sim.agent(a).unwrap().energy(), 198);

    // Tick 2: a turns north; the countdown finishes.
    sim.tick().unwrap();
    assert_eq!(sim.population(), 2);
    assert_eq!(sim.agent(a).unwrap().energy(), 197);

    // Tick 3: a steps away and leaves the child in the vacated cell.
    let summary = sim.tick().unwrap();
    assert_eq!(summary.births, 1);
    assert_eq!(sim.population(), 3);
    assert_eq!(sim.agent(a).unwrap().energy(), 197 - 100 - 1);
    assert!(!sim.agent(a).unwrap().is_pregnant());
    assert_eq!(sim.agent(b).unwrap().energy(), 100);

    let child = sim.environment().get_agent(loc(1, 1)).unwrap();
    assert_eq!(child, AgentId(3));
    assert_eq!(sim.agent(child).unwrap().energy(), 100);
    assert_eq!(sim.agent(child).unwrap().birth_tick(), 3);
    assert!(sim.scheduler().contains(child));
    assert_eq!(counts.seeded(), 2);
    assert_eq!(counts.born(), 1);
}

#[test]
fn asexual_breeding_uses_the_vacated_cell() {
    let mut config = empty_config(10, 10, true);
    config.agent_types = vec![habitat_agents::AgentParams {
        init_energy: 100,
        breed_energy: 50,
        asexual_breed_chance: 1.0,
        asex_pregnancy_period: 0,
        ..params()
    }];
    let mut sim = Simulation::new(config).unwrap();
    let modes = Arc::new(Mutex::new(Vec::new()));
    sim.add_listener(Box::new(Modes(Arc::clone(&modes))));

    let parent = place(
        &mut sim,
        0,
        (4, 4),
        Direction::East,
        Box::new(habitat_agents::ScriptedController::new(
            vec![Action::StepForward],
            true,
        )),
    );
    sim.agent_mut(parent)
        .unwrap()
        .change_energy(100, EnergyCause::Plugin);

    sim.tick().unwrap();
    assert!(sim.agent(parent).unwrap().is_pregnant());
    assert_eq!(sim.population(), 1);

    sim.tick().unwrap();
    assert_eq!(sim.population(), 2);
    assert_eq!(sim.agent(parent).unwrap().location(), loc(6, 4));
    assert_eq!(sim.agent(parent).unwrap().energy(), 199 - 100 - 1);
    assert!(sim.environment().has_agent(loc(5, 4)));
    assert_eq!(
        *modes.lock().unwrap(),
        vec![ReproductionMode::Seeded, ReproductionMode::Asexual]
    );
}

#[test]
fn pregnancy_is_aborted_below_breed_energy() {
    let mut config = empty_config(10, 10, true);
    config.agent_types = vec![habitat_agents::AgentParams {
        breed_energy: 50,
        sexual_pregnancy_period: 5,
        ..params()
    }];
    let mut sim = Simulation::new(config).unwrap();
    let a = place(
        &mut sim,
        0,
        (1, 1),
        Direction::East,
        script(&[Action::StepForward, Action::Rest]),
    );
    place(&mut sim, 0, (2, 1), Direction::West, script(&[Action::Rest]));

    sim.tick().unwrap();
    assert!(sim.agent(a).unwrap().is_pregnant());

    sim.agent_mut(a)
        .unwrap()
        .change_energy(-60, EnergyCause::Plugin);
    sim.tick().unwrap();
    assert!(!sim.agent(a).unwrap().is_pregnant());
    assert_eq!(sim.population(), 2);
}

#[test]
fn predator_eats_prey_below_breed_energy() {
    let mut config = empty_config(10, 10, true);
    let mut predator = habitat_agents::AgentParams {
        breed_energy: 200,
        agent_food_energy: 0.5,
        ..params()
    };
    predator.food_web.can_eat_agent = vec![false, true];
    config.agent_types = vec![predator, params()];
    let mut sim = Simulation::new(config).unwrap();
    let deaths = Deaths::default();
    let log = Arc::clone(&deaths.0);
    sim.add_listener(Box::new(deaths));

    let hunter = place(&mut sim, 0, (1, 1), Direction::East, script(&[Action::StepForward]));
    let prey = place(&mut sim, 1, (2, 1), Direction::North, script(&[Action::Rest]));

    let summary = sim.tick().unwrap();
    assert_eq!(summary.deaths, 1);
    assert_eq!(sim.population(), 1);
    assert!(sim.agent(prey).is_none());
    assert!(sim.environment().is_empty(loc(2, 1)));
    // bump cost 2, then half of the prey's 100 energy
    assert_eq!(sim.agent(hunter).unwrap().energy(), 100 - 2 + 50);
    assert_eq!(*log.lock().unwrap(), vec![(prey, DeathCause::Eaten)]);
}

#[test]
fn obstacles_cost_rock_energy_and_block() {
    let mut config = empty_config(5, 5, false);
    config.agent_types = vec![habitat_agents::AgentParams {
        step_rock_energy: 2,
        ..params()
    }];
    let mut sim = Simulation::new(config).unwrap();
    sim.environment_mut().add_stone(loc(3, 2)).unwrap();
    sim.environment_mut()
        .add_drop(
            loc(2, 3),
            Drop::Waste {
                created_at: 0,
                lifetime: 100,
            },
        )
        .unwrap();

    let at_edge = place(&mut sim, 0, (0, 0), Direction::West, script(&[Action::StepForward]));
    let at_stone = place(&mut sim, 0, (2, 2), Direction::East, script(&[Action::StepForward]));
    let at_waste = place(&mut sim, 0, (2, 4), Direction::North, script(&[Action::StepForward]));

    sim.tick().unwrap();
    for (id, origin) in [(at_edge, loc(0, 0)), (at_stone, loc(2, 2)), (at_waste, loc(2, 4))] {
        let agent = sim.agent(id).unwrap();
        assert_eq!(agent.location(), origin);
        assert_eq!(agent.energy(), 98);
    }
}

#[test]
fn inedible_food_blocks_but_costs_a_step() {
    let mut config = empty_config(6, 6, true);
    config.food_types = vec![still_food(), still_food()];
    let mut sim = Simulation::new(config).unwrap();
    sim.environment_mut().add_food(loc(3, 3), 1).unwrap();
    let id = place(&mut sim, 0, (2, 3), Direction::East, script(&[Action::StepForward]));

    sim.tick().unwrap();
    let agent = sim.agent(id).unwrap();
    assert_eq!(agent.location(), loc(2, 3));
    assert_eq!(agent.energy(), 99);
    assert_eq!(sim.environment().get_food_type(loc(3, 3)), Some(1));
}

#[test]
fn eating_food_leaves_waste_behind() {
    let mut config = empty_config(10, 10, true);
    config.food_types = vec![still_food()];
    config.agent_types = vec![habitat_agents::AgentParams {
        food_energy: 100,
        waste_mode: true,
        waste_gain_limit: 100,
        waste_decay: 20,
        ..params()
    }];
    let mut sim = Simulation::new(config).unwrap();
    sim.environment_mut().add_food(loc(2, 1), 0).unwrap();
    let id = place(&mut sim, 0, (1, 1), Direction::East, script(&[Action::StepForward]));

    sim.tick().unwrap();
    assert_eq!(sim.agent(id).unwrap().location(), loc(2, 1));
    assert_eq!(sim.agent(id).unwrap().energy(), 100 + 100 - 1);
    assert_eq!(sim.environment().count_food(0), 0);
    assert!(matches!(
        sim.environment().get_drop(loc(1, 1)),
        Some(Drop::Waste { created_at: 1, .. })
    ));

    for _ in 0..29 {
        sim.tick().unwrap();
    }
    let waste = sim
        .environment()
        .count_drops(|d| matches!(d, Drop::Waste { .. }));
    assert_eq!(waste, 0);
}

#[test]
fn stepping_on_a_product_consumes_it() {
    let mut sim = Simulation::new(empty_config(6, 6, true)).unwrap();
    sim.environment_mut()
        .add_drop(
            loc(3, 0),
            Drop::Product {
                producer: AgentId(99),
                producer_type: AgentType(0),
                value: 7,
            },
        )
        .unwrap();
    let id = place(&mut sim, 0, (2, 0), Direction::East, script(&[Action::StepForward]));

    sim.tick().unwrap();
    let agent = sim.agent(id).unwrap();
    assert_eq!(agent.location(), loc(3, 0));
    assert_eq!(agent.energy(), 100 + 7 - 1);
    assert!(!sim.environment().has_drop(loc(3, 0)));
}

#[test]
fn turning_rotates_and_costs_turn_energy() {
    let mut sim = Simulation::new(empty_config(6, 6, true)).unwrap();
    let id = place(&mut sim, 0, (2, 2), Direction::East, script(&[Action::TurnLeft]));

    sim.tick().unwrap();
    let agent = sim.agent(id).unwrap();
    assert_eq!(agent.facing(), Direction::North);
    assert_eq!(agent.location(), loc(2, 2));
    assert_eq!(agent.energy(), 99);
}

#[test]
fn old_age_kills_at_the_limit() {
    let mut config = empty_config(6, 6, true);
    config.agent_types = vec![habitat_agents::AgentParams {
        aging_mode: true,
        aging_limit: 3,
        aging_rate: 0.0,
        ..params()
    }];
    let mut sim = Simulation::new(config).unwrap();
    let deaths = Deaths::default();
    let log = Arc::clone(&deaths.0);
    sim.add_listener(Box::new(deaths));
    let id = place(&mut sim, 0, (0, 0), Direction::East, script(&[Action::Rest]));

    sim.tick().unwrap();
    sim.tick().unwrap();
    assert!(sim.agent(id).is_some());
    sim.tick().unwrap();
    assert!(sim.agent(id).is_none());
    assert_eq!(*log.lock().unwrap(), vec![(id, DeathCause::OldAge)]);
}

#[test]
fn starving_agent_dies_in_the_same_tick() {
    let mut config = empty_config(6, 6, true);
    config.agent_types = vec![habitat_agents::AgentParams {
        init_energy: 3,
        ..params()
    }];
    let mut sim = Simulation::new(config).unwrap();
    let id = place(&mut sim, 0, (0, 0), Direction::East, script(&[Action::StepForward]));

    sim.tick().unwrap();
    sim.tick().unwrap();
    assert_eq!(sim.agent(id).unwrap().energy(), 1);
    let summary = sim.tick().unwrap();
    assert_eq!(summary.deaths, 1);
    assert_eq!(sim.population(), 0);
    assert!(sim.scheduler().is_empty());
    assert_eq!(sim.environment().count_empty(), 36);
}

#[test]
fn food_broadcast_reaches_listeners_in_range() {
    let mut config = empty_config(10, 10, true);
    config.food_types = vec![still_food()];
    config.agent_types = vec![habitat_agents::AgentParams {
        broadcast_mode: true,
        broadcast_energy_min: 20,
        broadcast_energy_cost: 5,
        broadcast_range: 20.0,
        food_energy: 100,
        ..params()
    }];
    let mut sim = Simulation::new(config).unwrap();
    sim.environment_mut().add_food(loc(2, 1), 0).unwrap();

    let sender = place(&mut sim, 0, (1, 1), Direction::East, script(&[Action::StepForward]));
    let listener = RecordingController::new(Action::Rest, false);
    let log = listener.log();
    let receiver = place(&mut sim, 0, (1, 4), Direction::North, listener.boxed());

    sim.tick().unwrap();
    assert_eq!(sim.environment().conduit().len(), 1);
    assert_eq!(sim.agent(sender).unwrap().energy(), 100 - 5 + 100 - 1);

    let seen = drain(&log);
    assert_eq!(seen.len(), 1);
    let first = seen.first().unwrap();
    assert_eq!(first.agent, receiver);
    let expected = 1.0 / 10.0_f64.sqrt();
    assert!((first.comm_inbox - expected).abs() < 1e-9);
}

#[derive(Debug)]
struct Failing;

impl UpdateMutator for Failing {
    fn on_update(
        &mut self,
        _agent: &mut Agent,
        _ctx: &mut MutatorContext<'_>,
    ) -> Result<(), AgentError> {
        Err(AgentError::Mutator {
            mutator: "failing",
            reason: "refused".to_owned(),
        })
    }
}

impl Mutator for Failing {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn as_update(&mut self) -> Option<&mut dyn UpdateMutator> {
        Some(self)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[test]
fn failing_mutator_aborts_the_tick() {
    let mut sim = Simulation::new(empty_config(6, 6, true)).unwrap();
    sim.add_mutator(Box::new(Failing));
    place(&mut sim, 0, (0, 0), Direction::East, script(&[Action::Rest]));

    let err = sim.tick().unwrap_err();
    assert!(matches!(err, TickError::Mutator { .. }));
}

/// Empties one side of every contact.
#[derive(Debug)]
struct Drain {
    bumper: bool,
}

impl ContactMutator for Drain {
    fn on_contact(
        &mut self,
        bumper: &mut Agent,
        bumpee: &mut Agent,
        _ctx: &mut MutatorContext<'_>,
    ) -> Result<(), AgentError> {
        let target = if self.bumper { bumper } else { bumpee };
        let energy = target.energy();
        target.spend_energy(energy, EnergyCause::Plugin);
        Ok(())
    }
}

impl Mutator for Drain {
    fn name(&self) -> &'static str {
        "drain"
    }

    fn as_contact(&mut self) -> Option<&mut dyn ContactMutator> {
        Some(self)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[test]
fn drained_bumpee_dies_even_after_acting() {
    let mut sim = Simulation::new(empty_config(6, 6, true)).unwrap();
    sim.add_mutator(Box::new(Drain { bumper: false }));
    let deaths = Deaths::default();
    let log = Arc::clone(&deaths.0);
    sim.add_listener(Box::new(deaths));

    // Scheduled first, so it has already rested when it is bumped.
    let bumpee = place(&mut sim, 0, (2, 1), Direction::West, script(&[Action::Rest]));
    let bumper = place(&mut sim, 0, (1, 1), Direction::East, script(&[Action::StepForward]));

    let summary = sim.tick().unwrap();
    assert_eq!(summary.deaths, 1);
    assert!(sim.agent(bumpee).is_none());
    assert!(!sim.scheduler().contains(bumpee));
    assert!(sim.environment().is_empty(loc(2, 1)));
    assert_eq!(*log.lock().unwrap(), vec![(bumpee, DeathCause::Starvation)]);

    let survivor = sim.agent(bumper).unwrap();
    assert_eq!(survivor.location(), loc(1, 1));
    assert_eq!(survivor.energy(), 100 - 2);
}

#[test]
fn drained_bumper_dies_in_the_same_tick() {
    let mut sim = Simulation::new(empty_config(6, 6, true)).unwrap();
    sim.add_mutator(Box::new(Drain { bumper: true }));
    let deaths = Deaths::default();
    let log = Arc::clone(&deaths.0);
    sim.add_listener(Box::new(deaths));

    let bumper = place(&mut sim, 0, (1, 1), Direction::East, script(&[Action::StepForward]));
    let bumpee = place(&mut sim, 0, (2, 1), Direction::West, script(&[Action::Rest]));

    sim.tick().unwrap();
    assert!(sim.agent(bumper).is_none());
    assert!(sim.environment().is_empty(loc(1, 1)));
    assert_eq!(*log.lock().unwrap(), vec![(bumper, DeathCause::Starvation)]);
    assert_eq!(sim.agent(bumpee).unwrap().energy(), 100);
}

#[test]
fn eating_the_partner_falls_back_to_asexual_birth() {
    let mut config = empty_config(10, 10, true);
    let mut cannibal = habitat_agents::AgentParams {
        init_energy: 100,
        breed_energy: 50,
        sexual_breed_chance: 1.0,
        sexual_pregnancy_period: 2,
        agent_food_energy: 1.0,
        ..params()
    };
    cannibal.food_web.can_eat_agent = vec![true];
    config.agent_types = vec![cannibal];
    let mut sim = Simulation::new(config).unwrap();
    let modes = Arc::new(Mutex::new(Vec::new()));
    sim.add_listener(Box::new(Modes(Arc::clone(&modes))));

    let a = place(&mut sim, 0, (1, 1), Direction::East, script(&[Action::StepForward]));
    let b = place(&mut sim, 0, (2, 1), Direction::West, script(&[Action::Rest]));

    // Tick 1: well fed, so a mates with b instead of eating it.
    sim.tick().unwrap();
    assert_eq!(sim.agent(a).unwrap().pregnancy().unwrap().partner, Some(b));

    // Tick 2: hungry now, a eats its own partner.
    sim.agent_mut(a)
        .unwrap()
        .change_energy(-60, EnergyCause::Plugin);
    sim.tick().unwrap();
    assert!(sim.agent(b).is_none());
    let pregnancy = sim.agent(a).unwrap().pregnancy().unwrap();
    assert_eq!(pregnancy.partner, None);
    assert_eq!(sim.agent(a).unwrap().energy(), 38 - 2 + 100);

    // Tick 3: the child is born to a alone.
    let summary = sim.tick().unwrap();
    assert_eq!(summary.births, 1);
    assert_eq!(sim.agent(a).unwrap().location(), loc(2, 1));
    assert_eq!(sim.agent(a).unwrap().energy(), 136 - 100 - 1);
    assert!(sim.environment().has_agent(loc(1, 1)));
    assert_eq!(
        *modes.lock().unwrap(),
        vec![
            ReproductionMode::Seeded,
            ReproductionMode::Seeded,
            ReproductionMode::Asexual
        ]
    );
}

#[test]
fn stepping_costs_more_away_from_the_island() {
    let mut config = empty_config(10, 10, false);
    config.agent_types = vec![habitat_agents::AgentParams {
        init_energy: 100,
        step_energy: 1,
        aging_mode: false,
        ..params()
    }];
    config.abiotic.factors = vec![habitat_agents::IslandFactor {
        position_x: 0.5,
        transition: 10.0,
        ..habitat_agents::IslandFactor::default()
    }];
    config.abiotic.agents = vec![habitat_agents::AbioticAgentParams {
        preferred: vec![1.0],
        parameter: habitat_agents::AgentParameter::StepEnergy,
        sensitivity: 2.0,
    }];
    let mut sim = Simulation::new(config).unwrap();
    let castaway = place(&mut sim, 0, (0, 0), Direction::East, script(&[Action::StepForward]));
    let islander = place(&mut sim, 0, (5, 5), Direction::North, script(&[Action::StepForward]));
    assert_eq!(sim.agent(castaway).unwrap().params().step_energy, 3);
    assert_eq!(sim.agent(islander).unwrap().params().step_energy, 1);

    sim.tick().unwrap();
    sim.tick().unwrap();

    assert_eq!(sim.agent(castaway).unwrap().energy(), 100 - 3 - 3);
    assert_eq!(sim.agent(islander).unwrap().energy(), 100 - 1 - 1);
    assert_eq!(sim.agent(islander).unwrap().location(), loc(5, 3));
}

#[test]
fn seeded_genes_set_each_type_apart() {
    let mut config = empty_config(10, 10, true);
    let walker = habitat_agents::AgentParams {
        init_energy: 100,
        step_energy: 4,
        aging_mode: false,
        ..params()
    };
    config.agent_types = vec![walker.clone(), walker];
    config.phenotype.genes = vec![habitat_agents::GeneParams {
        parameter: habitat_agents::AgentParameter::StepEnergy,
        initial: vec![64, 192],
    }];
    let mut sim = Simulation::new(config).unwrap();
    let light = place(&mut sim, 0, (0, 0), Direction::East, script(&[Action::StepForward]));
    let heavy = place(&mut sim, 1, (0, 5), Direction::East, script(&[Action::StepForward]));

    sim.tick().unwrap();

    assert_eq!(sim.agent(light).unwrap().energy(), 100 - 2);
    assert_eq!(sim.agent(heavy).unwrap().energy(), 100 - 6);
}
