//! Configuration loading and typed config structures for the Habitat
//! simulation.
//!
//! The configuration lives in `habitat-config.yaml`. Every field carries a
//! serde default, so an empty document describes a valid (if small)
//! simulation. [`SimulationConfig::validate`] rejects inconsistent tables
//! before anything is built, and [`SimulationConfig::normalize`] fills the
//! matrices left empty in the YAML.

use std::path::Path;

use serde::Deserialize;

use habitat_agents::{
    AbioticParams, AgentParameter, AgentParams, ControllerParams, DiseaseParams, PhenotypeParams,
    ProductionParams,
};
use habitat_types::AgentType;
use habitat_world::FoodParams;

/// Errors that can occur when loading or checking configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The tables disagree with each other or hold impossible values.
    #[error("inconsistent configuration: {reason}")]
    Inconsistent {
        /// What is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `habitat-config.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Seed and run bounds.
    #[serde(default)]
    pub world: WorldConfig,

    /// Grid shape.
    #[serde(default)]
    pub topology: TopologyConfig,

    /// Stones and broadcast settings.
    #[serde(default)]
    pub environment: EnvironmentConfig,

    /// One parameter row per agent type.
    #[serde(default = "default_agent_types")]
    pub agent_types: Vec<AgentParams>,

    /// One growth row per food type.
    #[serde(default = "default_food_types")]
    pub food_types: Vec<FoodParams>,

    /// Disease rows, one per agent type. Empty disables the disease mutator.
    #[serde(default)]
    pub disease: Vec<DiseaseParams>,

    /// Production rows, one per agent type. Empty disables production.
    #[serde(default)]
    pub production: Vec<ProductionParams>,

    /// Environmental fields and how each agent type reacts to them.
    #[serde(default)]
    pub abiotic: AbioticParams,

    /// Heritable genes scaling agent parameters.
    #[serde(default)]
    pub phenotype: PhenotypeParams,

    /// How seeded agents decide what to do.
    #[serde(default)]
    pub controller: ControllerParams,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            topology: TopologyConfig::default(),
            environment: EnvironmentConfig::default(),
            agent_types: default_agent_types(),
            food_types: default_food_types(),
            disease: Vec::new(),
            production: Vec::new(),
            abiotic: AbioticParams::default(),
            phenotype: PhenotypeParams::default(),
            controller: ControllerParams::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// Number of agent types.
    pub fn agent_type_count(&self) -> usize {
        self.agent_types.len()
    }

    /// Check that every table agrees with the agent and food type counts
    /// and that every probability lies in `[0, 1]`.
    ///
    /// Empty food-web rows and disease matrices are allowed; they are
    /// filled by [`normalize`](Self::normalize).
    pub fn validate(&self) -> Result<(), ConfigError> {
        let agent_types = self.agent_types.len();
        let food_types = self.food_types.len();

        if self.topology.width == 0 || self.topology.height == 0 {
            return inconsistent(format!(
                "grid must be non-empty, got {}x{}",
                self.topology.width, self.topology.height
            ));
        }
        if agent_types == 0 {
            return inconsistent("at least one agent type is required".to_owned());
        }

        for (index, params) in self.agent_types.iter().enumerate() {
            let web = &params.food_web;
            if !web.can_eat_food.is_empty() && web.can_eat_food.len() != food_types {
                return inconsistent(format!(
                    "agent type {index}: can_eat_food has {} entries, expected {food_types}",
                    web.can_eat_food.len()
                ));
            }
            if !web.can_eat_agent.is_empty() && web.can_eat_agent.len() != agent_types {
                return inconsistent(format!(
                    "agent type {index}: can_eat_agent has {} entries, expected {agent_types}",
                    web.can_eat_agent.len()
                ));
            }
            check_probability(index, "asexual_breed_chance", params.asexual_breed_chance)?;
            check_probability(index, "sexual_breed_chance", params.sexual_breed_chance)?;
        }

        for (index, food) in self.food_types.iter().enumerate() {
            check_probability(index, "grow_chance", food.grow_chance)?;
            check_probability(index, "drop_rate", food.drop_rate)?;
        }

        if !self.disease.is_empty() {
            if self.disease.len() != agent_types {
                return inconsistent(format!(
                    "disease has {} rows, expected {agent_types}",
                    self.disease.len()
                ));
            }
            for (index, row) in self.disease.iter().enumerate() {
                for (name, matrix) in [
                    ("transmit_to", &row.transmit_to),
                    ("can_heal", &row.can_heal),
                    ("can_vaccinate", &row.can_vaccinate),
                ] {
                    if !matrix.is_empty() && matrix.len() != agent_types {
                        return inconsistent(format!(
                            "disease row {index}: {name} has {} entries, expected {agent_types}",
                            matrix.len()
                        ));
                    }
                }
                for (name, value) in [
                    ("initial_infection", row.initial_infection),
                    ("initial_vaccination", row.initial_vaccination),
                    ("contact_transmit_rate", row.contact_transmit_rate),
                    ("child_transmit_rate", row.child_transmit_rate),
                    ("vaccine_effectiveness", row.vaccine_effectiveness),
                    ("healer_effectiveness", row.healer_effectiveness),
                    ("ppe_chance", row.ppe_chance),
                    ("ppe_effectiveness", row.ppe_effectiveness),
                ] {
                    check_probability(index, name, value)?;
                }
            }
        }

        if !self.production.is_empty() {
            if self.production.len() != agent_types {
                return inconsistent(format!(
                    "production has {} rows, expected {agent_types}",
                    self.production.len()
                ));
            }
            for (index, row) in self.production.iter().enumerate() {
                check_probability(index, "produce_chance", row.produce_chance)?;
            }
        }

        self.validate_abiotic(agent_types)?;
        self.validate_phenotype(agent_types)?;

        let cells = u64::from(self.topology.width).saturating_mul(u64::from(self.topology.height));
        let agents: u64 = self
            .agent_types
            .iter()
            .map(|p| u64::from(p.initial_agents))
            .sum();
        let occupied = agents.saturating_add(u64::from(self.environment.stones));
        if occupied > cells {
            return inconsistent(format!(
                "{agents} initial agents and {} stones do not fit on {cells} cells",
                self.environment.stones
            ));
        }

        Ok(())
    }

    fn validate_abiotic(&self, agent_types: usize) -> Result<(), ConfigError> {
        let abiotic = &self.abiotic;
        if abiotic.factors.is_empty() {
            return Ok(());
        }
        if !abiotic.agents.is_empty() && abiotic.agents.len() != agent_types {
            return inconsistent(format!(
                "abiotic has {} agent rows, expected {agent_types}",
                abiotic.agents.len()
            ));
        }
        for (index, factor) in abiotic.factors.iter().enumerate() {
            if !(factor.size_x > 0.0 && factor.size_y > 0.0) {
                return inconsistent(format!("abiotic factor {index}: island size must be positive"));
            }
        }
        for (index, row) in abiotic.agents.iter().enumerate() {
            if row.preferred.len() > abiotic.factors.len() {
                return inconsistent(format!(
                    "abiotic row {index}: {} preferences for {} factors",
                    row.preferred.len(),
                    abiotic.factors.len()
                ));
            }
            if row.sensitivity.is_sign_negative() || !row.sensitivity.is_finite() {
                return inconsistent(format!(
                    "abiotic row {index}: sensitivity = {} must be a non-negative number",
                    row.sensitivity
                ));
            }
            // Both mutators restore from their own saved value, so they
            // must not share a parameter.
            let disease = self.disease.get(index).map(|d| d.parameter);
            if row.parameter != AgentParameter::None && disease == Some(row.parameter) {
                return inconsistent(format!(
                    "agent type {index}: disease and abiotic both scale {:?}",
                    row.parameter
                ));
            }
        }
        Ok(())
    }

    fn validate_phenotype(&self, agent_types: usize) -> Result<(), ConfigError> {
        let phenotype = &self.phenotype;
        if !(0.0..=1.0).contains(&phenotype.mutation_rate) {
            return inconsistent(format!(
                "phenotype: mutation_rate = {} is not a probability",
                phenotype.mutation_rate
            ));
        }
        for (index, gene) in phenotype.genes.iter().enumerate() {
            if !gene.initial.is_empty() && gene.initial.len() != agent_types {
                return inconsistent(format!(
                    "gene {index}: initial has {} entries, expected {agent_types}",
                    gene.initial.len()
                ));
            }
        }
        Ok(())
    }

    /// Fill empty food-web rows, disease matrices, abiotic rows and gene
    /// values with their defaults.
    pub fn normalize(&mut self) {
        let agent_types = self.agent_types.len();
        let food_types = self.food_types.len();
        for (index, params) in self.agent_types.iter_mut().enumerate() {
            params
                .food_web
                .resize(AgentType(index), agent_types, food_types);
        }
        for row in &mut self.disease {
            row.resize(agent_types);
        }
        if !self.abiotic.factors.is_empty() {
            self.abiotic.resize(agent_types);
        }
        self.phenotype.resize(agent_types);
    }
}

fn inconsistent(reason: String) -> Result<(), ConfigError> {
    Err(ConfigError::Inconsistent { reason })
}

fn check_probability(index: usize, name: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        inconsistent(format!("row {index}: {name} = {value} is not a probability"))
    }
}

/// Seed and run bounds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Real-time milliseconds between ticks in the run loop.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Stop after this many ticks (0 = unlimited).
    #[serde(default)]
    pub max_ticks: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            tick_interval_ms: default_tick_interval_ms(),
            max_ticks: 0,
        }
    }
}

/// Grid shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TopologyConfig {
    /// Columns.
    #[serde(default = "default_grid_size")]
    pub width: u32,

    /// Rows.
    #[serde(default = "default_grid_size")]
    pub height: u32,

    /// Whether the grid wraps at its edges.
    #[serde(default = "default_true")]
    pub wrap: bool,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            width: default_grid_size(),
            height: default_grid_size(),
            wrap: true,
        }
    }
}

/// Obstacles and broadcast settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct EnvironmentConfig {
    /// Stones scattered at random when the simulation is built.
    #[serde(default)]
    pub stones: u32,

    /// Ticks a broadcast packet stays audible.
    #[serde(default = "default_packet_lifetime")]
    pub packet_lifetime: u64,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            stones: 0,
            packet_lifetime: default_packet_lifetime(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit population statistics every this many ticks (0 = never).
    #[serde(default = "default_stats_interval")]
    pub stats_interval: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            stats_interval: default_stats_interval(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

fn default_agent_types() -> Vec<AgentParams> {
    vec![AgentParams::default()]
}

fn default_food_types() -> Vec<FoodParams> {
    vec![FoodParams::default()]
}

const fn default_seed() -> u64 {
    42
}

const fn default_tick_interval_ms() -> u64 {
    100
}

const fn default_grid_size() -> u32 {
    64
}

const fn default_packet_lifetime() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_stats_interval() -> u64 {
    100
}

const fn default_true() -> bool {
    true
}
