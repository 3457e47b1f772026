//! Agent state, controllers, and mutators for the Habitat simulation.
//!
//! This crate holds everything that belongs to a single agent or acts on
//! agents through lifecycle hooks. It sits between `habitat-world` (the grid)
//! and `habitat-core` (the scheduler and state machine that drive agents).
//!
//! # Modules
//!
//! - [`agent`] -- The agent record ([`Agent`]): energy, pregnancy, messages,
//!   bad-agent memory, and extension state.
//! - [`config`] -- Per-type parameter bundles ([`AgentParams`], [`FoodWeb`],
//!   [`DiseaseParams`], [`ProductionParams`]).
//! - [`controller`] -- The [`Controller`] capability and the scripted and
//!   random variants.
//! - [`genetic`] -- Lookup-table controller with an evolvable genome.
//! - [`similarity`] -- Genome similarity between two controllers.
//! - [`extension`] -- Typed per-agent extension state ([`ExtensionBag`]).
//! - [`mutator`] -- Mutator capabilities and registration-ordered dispatch.
//! - [`plugins`] -- Built-in disease, production, abiotic, and phenotype
//!   mutators.
//! - [`error`] -- Error types for agent operations ([`AgentError`]).

pub mod agent;
pub mod config;
pub mod controller;
pub mod error;
pub mod extension;
pub mod genetic;
pub mod mutator;
pub mod plugins;
pub mod similarity;

pub use agent::{Agent, Pregnancy};
pub use config::{AgentParameter, AgentParams, DiseaseParams, FoodWeb, ProductionParams};
pub use controller::{
    Controller, ControllerInput, ControllerParams, Decision, RandomController, ScriptedController,
    Sensed,
};
pub use error::AgentError;
pub use extension::ExtensionBag;
pub use genetic::{GeneticController, GeneticParams};
pub use mutator::{
    ContactMutator, DeathMutator, LoggingMutator, Mutator, MutatorContext, MutatorRegistry,
    Parents, SpawnMutator, UpdateMutator,
};
pub use plugins::{
    AbioticAgentParams, AbioticMutator, AbioticParams, AbioticState, DiseaseMutator, GeneParams,
    GeneState, IslandFactor, MeiosisMode, PhenotypeMutator, PhenotypeParams, ProductionMutator,
    ProductionState,
};
pub use similarity::genome_similarity;
