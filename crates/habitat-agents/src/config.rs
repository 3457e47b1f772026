//! Per-agent-type parameter bundles.
//!
//! Every agent type has one [`AgentParams`] row (energy economy, breeding,
//! aging, broadcast, waste), plus optional [`DiseaseParams`] and
//! [`ProductionParams`] rows consumed by the built-in mutators. Rows are
//! cloned into each agent when it spawns, so later edits to the
//! configuration never change a live agent's economy.
//!
//! Every field carries a serde default so a partial YAML row is valid.

use serde::{Deserialize, Serialize};

use habitat_types::AgentType;

/// Which agents and foods a type may eat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodWeb {
    /// Indexed by food type.
    #[serde(default)]
    pub can_eat_food: Vec<bool>,
    /// Indexed by agent type.
    #[serde(default)]
    pub can_eat_agent: Vec<bool>,
}

impl FoodWeb {
    /// Whether this type may eat food of `food_type`.
    pub fn eats_food(&self, food_type: usize) -> bool {
        self.can_eat_food.get(food_type).copied().unwrap_or(false)
    }

    /// Whether this type may eat agents of `agent_type`.
    pub fn eats_agent(&self, agent_type: AgentType) -> bool {
        self.can_eat_agent
            .get(agent_type.index())
            .copied()
            .unwrap_or(false)
    }

    /// Fill empty rows with defaults: eat own-typed food, eat no agents.
    ///
    /// Non-empty rows are left alone; size mismatches are reported by
    /// configuration validation instead.
    pub fn resize(&mut self, own_type: AgentType, agent_types: usize, food_types: usize) {
        if self.can_eat_food.is_empty() {
            self.can_eat_food = (0..food_types).map(|t| t == own_type.index()).collect();
        }
        if self.can_eat_agent.is_empty() {
            self.can_eat_agent = vec![false; agent_types];
        }
    }
}

/// Energy economy and behaviour switches for one agent type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentParams {
    /// Agents of this type seeded at simulation start.
    #[serde(default = "default_initial_agents")]
    pub initial_agents: u32,

    /// Energy a newly spawned agent starts with; also the parent's cost of
    /// producing a child.
    #[serde(default = "default_init_energy")]
    pub init_energy: i32,

    /// Gain from eating food of the agent's own type.
    #[serde(default = "default_food_energy")]
    pub food_energy: i32,

    /// Gain from eating any other edible food type.
    #[serde(default = "default_other_food_energy")]
    pub other_food_energy: i32,

    /// Fraction of a victim's energy gained by eating it.
    #[serde(default = "default_agent_food_energy")]
    pub agent_food_energy: f64,

    /// Energy threshold for breeding (and the ceiling under which an agent
    /// will eat other agents).
    #[serde(default = "default_breed_energy")]
    pub breed_energy: i32,

    /// Pregnancy length after asexual conception, in actions.
    #[serde(default = "default_asex_pregnancy_period")]
    pub asex_pregnancy_period: u32,

    /// Chance per opportunity of asexual conception.
    #[serde(default)]
    pub asexual_breed_chance: f64,

    /// Pregnancy length after sexual conception, in actions.
    #[serde(default = "default_sexual_pregnancy_period")]
    pub sexual_pregnancy_period: u32,

    /// Chance per same-type bump of sexual conception.
    #[serde(default = "default_sexual_breed_chance")]
    pub sexual_breed_chance: f64,

    /// Minimum similarity for sexual conception.
    #[serde(default)]
    pub breed_sim_min: f64,

    /// Minimum similarity for passing a message on bump.
    #[serde(default)]
    pub comm_sim_min: f64,

    /// Cost of a successful step.
    #[serde(default = "default_step_energy")]
    pub step_energy: i32,

    /// Cost of bumping a stone, waste, or grid edge.
    #[serde(default = "default_step_rock_energy")]
    pub step_rock_energy: i32,

    /// Cost of bumping another agent.
    #[serde(default = "default_step_agent_energy")]
    pub step_agent_energy: i32,

    /// Cost of turning left.
    #[serde(default = "default_turn_energy")]
    pub turn_left_energy: i32,

    /// Cost of turning right.
    #[serde(default = "default_turn_energy")]
    pub turn_right_energy: i32,

    /// Whether age kills and age penalties apply.
    #[serde(default)]
    pub aging_mode: bool,

    /// Age in ticks at which an agent dies of old age.
    #[serde(default = "default_aging_limit")]
    pub aging_limit: u64,

    /// Scale of the age penalty ramp.
    #[serde(default = "default_aging_rate")]
    pub aging_rate: f64,

    /// Whether this type sends and listens to broadcasts.
    #[serde(default)]
    pub broadcast_mode: bool,

    /// Minimum energy required to broadcast.
    #[serde(default = "default_broadcast_energy_min")]
    pub broadcast_energy_min: i32,

    /// Energy cost of one broadcast.
    #[serde(default = "default_broadcast_energy_cost")]
    pub broadcast_energy_cost: i32,

    /// Topology distance a broadcast reaches.
    #[serde(default = "default_broadcast_range")]
    pub broadcast_range: f64,

    /// Whether conceiving sexually also broadcasts a breed packet.
    #[serde(default)]
    pub broadcast_on_breed: bool,

    /// Whether eating produces waste.
    #[serde(default)]
    pub waste_mode: bool,

    /// Energy gained from food before one waste drop is produced.
    #[serde(default = "default_waste_gain_limit")]
    pub waste_gain_limit: i32,

    /// Ticks a waste drop lasts.
    #[serde(default = "default_waste_decay")]
    pub waste_decay: u64,

    /// Number of untrusted agents remembered.
    #[serde(default = "default_pd_memory")]
    pub pd_memory: usize,

    /// Eating compatibility.
    #[serde(default)]
    pub food_web: FoodWeb,
}

impl Default for AgentParams {
    fn default() -> Self {
        Self {
            initial_agents: default_initial_agents(),
            init_energy: default_init_energy(),
            food_energy: default_food_energy(),
            other_food_energy: default_other_food_energy(),
            agent_food_energy: default_agent_food_energy(),
            breed_energy: default_breed_energy(),
            asex_pregnancy_period: default_asex_pregnancy_period(),
            asexual_breed_chance: 0.0,
            sexual_pregnancy_period: default_sexual_pregnancy_period(),
            sexual_breed_chance: default_sexual_breed_chance(),
            breed_sim_min: 0.0,
            comm_sim_min: 0.0,
            step_energy: default_step_energy(),
            step_rock_energy: default_step_rock_energy(),
            step_agent_energy: default_step_agent_energy(),
            turn_left_energy: default_turn_energy(),
            turn_right_energy: default_turn_energy(),
            aging_mode: false,
            aging_limit: default_aging_limit(),
            aging_rate: default_aging_rate(),
            broadcast_mode: false,
            broadcast_energy_min: default_broadcast_energy_min(),
            broadcast_energy_cost: default_broadcast_energy_cost(),
            broadcast_range: default_broadcast_range(),
            broadcast_on_breed: false,
            waste_mode: false,
            waste_gain_limit: default_waste_gain_limit(),
            waste_decay: default_waste_decay(),
            pd_memory: default_pd_memory(),
            food_web: FoodWeb::default(),
        }
    }
}

/// A numeric agent parameter that a mutator may scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentParameter {
    /// Affects nothing.
    #[default]
    None,
    /// [`AgentParams::init_energy`].
    InitEnergy,
    /// [`AgentParams::food_energy`].
    FoodEnergy,
    /// [`AgentParams::other_food_energy`].
    OtherFoodEnergy,
    /// [`AgentParams::agent_food_energy`].
    AgentFoodEnergy,
    /// [`AgentParams::breed_energy`].
    BreedEnergy,
    /// [`AgentParams::step_energy`].
    StepEnergy,
    /// [`AgentParams::step_rock_energy`].
    StepRockEnergy,
    /// [`AgentParams::step_agent_energy`].
    StepAgentEnergy,
    /// [`AgentParams::turn_left_energy`].
    TurnLeftEnergy,
    /// [`AgentParams::turn_right_energy`].
    TurnRightEnergy,
    /// [`AgentParams::asexual_breed_chance`].
    AsexualBreedChance,
    /// [`AgentParams::sexual_breed_chance`].
    SexualBreedChance,
}

impl AgentParameter {
    /// Read the parameter as a float, or `None` for [`AgentParameter::None`].
    pub fn get(self, params: &AgentParams) -> Option<f64> {
        let value = match self {
            Self::None => return None,
            Self::InitEnergy => f64::from(params.init_energy),
            Self::FoodEnergy => f64::from(params.food_energy),
            Self::OtherFoodEnergy => f64::from(params.other_food_energy),
            Self::AgentFoodEnergy => params.agent_food_energy,
            Self::BreedEnergy => f64::from(params.breed_energy),
            Self::StepEnergy => f64::from(params.step_energy),
            Self::StepRockEnergy => f64::from(params.step_rock_energy),
            Self::StepAgentEnergy => f64::from(params.step_agent_energy),
            Self::TurnLeftEnergy => f64::from(params.turn_left_energy),
            Self::TurnRightEnergy => f64::from(params.turn_right_energy),
            Self::AsexualBreedChance => params.asexual_breed_chance,
            Self::SexualBreedChance => params.sexual_breed_chance,
        };
        Some(value)
    }

    /// Write the parameter; integer fields truncate toward zero.
    pub fn set(self, params: &mut AgentParams, value: f64) {
        match self {
            Self::None => {}
            Self::InitEnergy => params.init_energy = truncate_to_i32(value),
            Self::FoodEnergy => params.food_energy = truncate_to_i32(value),
            Self::OtherFoodEnergy => params.other_food_energy = truncate_to_i32(value),
            Self::AgentFoodEnergy => params.agent_food_energy = value,
            Self::BreedEnergy => params.breed_energy = truncate_to_i32(value),
            Self::StepEnergy => params.step_energy = truncate_to_i32(value),
            Self::StepRockEnergy => params.step_rock_energy = truncate_to_i32(value),
            Self::StepAgentEnergy => params.step_agent_energy = truncate_to_i32(value),
            Self::TurnLeftEnergy => params.turn_left_energy = truncate_to_i32(value),
            Self::TurnRightEnergy => params.turn_right_energy = truncate_to_i32(value),
            Self::AsexualBreedChance => params.asexual_breed_chance = value,
            Self::SexualBreedChance => params.sexual_breed_chance = value,
        }
    }
}

/// Truncate a float toward zero into `i32`, saturating at the bounds.
///
/// NaN maps to 0.
#[allow(clippy::cast_possible_truncation)]
pub fn truncate_to_i32(value: f64) -> i32 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
}

/// Disease behaviour for one agent type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseParams {
    /// Chance a seeded agent starts sick.
    #[serde(default)]
    pub initial_infection: f64,

    /// Chance a seeded agent starts vaccinated.
    #[serde(default)]
    pub initial_vaccination: f64,

    /// Chance this type catches the disease from a sick contact.
    #[serde(default = "default_contact_transmit_rate")]
    pub contact_transmit_rate: f64,

    /// Chance a child of a sick parent starts sick.
    #[serde(default = "default_child_transmit_rate")]
    pub child_transmit_rate: f64,

    /// Which parameter the disease scales.
    #[serde(default)]
    pub parameter: AgentParameter,

    /// Multiplier applied to `parameter` while sick.
    #[serde(default = "default_factor")]
    pub factor: f64,

    /// Whether this type vaccinates the agents it bumps.
    #[serde(default)]
    pub vaccinator: bool,

    /// Chance a vaccination given by this type blocks a transmission.
    #[serde(default = "default_effectiveness")]
    pub vaccine_effectiveness: f64,

    /// Whether this type heals the agents it bumps.
    #[serde(default)]
    pub healer: bool,

    /// Chance a heal attempt by this type succeeds.
    #[serde(default = "default_effectiveness")]
    pub healer_effectiveness: f64,

    /// Base ticks until recovery; 0 means never recover.
    #[serde(default)]
    pub recovery_time: u64,

    /// Agent types this type can infect, indexed by agent type.
    #[serde(default)]
    pub transmit_to: Vec<bool>,

    /// Agent types this type can heal.
    #[serde(default)]
    pub can_heal: Vec<bool>,

    /// Agent types this type can vaccinate.
    #[serde(default)]
    pub can_vaccinate: Vec<bool>,

    /// Chance an agent of this type is born wearing PPE.
    #[serde(default)]
    pub ppe_chance: f64,

    /// Chance this type's PPE blocks one transmission.
    #[serde(default = "default_effectiveness")]
    pub ppe_effectiveness: f64,
}

impl Default for DiseaseParams {
    fn default() -> Self {
        Self {
            initial_infection: 0.0,
            initial_vaccination: 0.0,
            contact_transmit_rate: default_contact_transmit_rate(),
            child_transmit_rate: default_child_transmit_rate(),
            parameter: AgentParameter::None,
            factor: default_factor(),
            vaccinator: false,
            vaccine_effectiveness: default_effectiveness(),
            healer: false,
            healer_effectiveness: default_effectiveness(),
            recovery_time: 0,
            transmit_to: Vec::new(),
            can_heal: Vec::new(),
            can_vaccinate: Vec::new(),
            ppe_chance: 0.0,
            ppe_effectiveness: default_effectiveness(),
        }
    }
}

impl DiseaseParams {
    /// Pad the per-type matrices to `agent_types` entries with `false`.
    pub fn resize(&mut self, agent_types: usize) {
        for row in [
            &mut self.transmit_to,
            &mut self.can_heal,
            &mut self.can_vaccinate,
        ] {
            if row.is_empty() {
                row.resize(agent_types, false);
            }
        }
    }
}

/// Production behaviour for one agent type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionParams {
    /// Chance per tick of placing a product next to the agent.
    #[serde(default)]
    pub produce_chance: f64,

    /// Energy a product grants to whoever steps on it.
    #[serde(default = "default_product_energy")]
    pub product_energy: i32,
}

impl Default for ProductionParams {
    fn default() -> Self {
        Self {
            produce_chance: 0.0,
            product_energy: default_product_energy(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_initial_agents() -> u32 {
    20
}

const fn default_init_energy() -> i32 {
    100
}

const fn default_food_energy() -> i32 {
    100
}

const fn default_other_food_energy() -> i32 {
    25
}

const fn default_agent_food_energy() -> f64 {
    0.5
}

const fn default_breed_energy() -> i32 {
    60
}

const fn default_asex_pregnancy_period() -> u32 {
    0
}

const fn default_sexual_pregnancy_period() -> u32 {
    5
}

const fn default_sexual_breed_chance() -> f64 {
    1.0
}

const fn default_step_energy() -> i32 {
    1
}

const fn default_step_rock_energy() -> i32 {
    2
}

const fn default_step_agent_energy() -> i32 {
    2
}

const fn default_turn_energy() -> i32 {
    1
}

const fn default_aging_limit() -> u64 {
    300
}

const fn default_aging_rate() -> f64 {
    10.0
}

const fn default_broadcast_energy_min() -> i32 {
    20
}

const fn default_broadcast_energy_cost() -> i32 {
    5
}

const fn default_broadcast_range() -> f64 {
    20.0
}

const fn default_waste_gain_limit() -> i32 {
    100
}

const fn default_waste_decay() -> u64 {
    20
}

const fn default_pd_memory() -> usize {
    2
}

const fn default_contact_transmit_rate() -> f64 {
    0.5
}

const fn default_child_transmit_rate() -> f64 {
    0.9
}

const fn default_factor() -> f64 {
    2.0
}

const fn default_effectiveness() -> f64 {
    1.0
}

const fn default_product_energy() -> i32 {
    10
}
