//! Scheduler, agent state machine, and run loop for the Habitat simulation.
//!
//! This crate turns the grid (`habitat-world`) and the agents
//! (`habitat-agents`) into a running simulation.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `habitat-config.yaml` into
//!   strongly-typed structs, with consistency checks.
//! - [`scheduler`] -- Ordered client registry and the tick counter.
//! - [`simulation`] -- [`Simulation`]: construction, seeding, spawn, kill,
//!   and the tick.
//! - `behavior` -- The per-agent state machine (step, turn, bump, eat,
//!   breed, die).
//! - [`listener`] -- [`PopulationListener`] and a counting implementation.
//! - [`stats`] -- Per-type population statistics.
//! - [`control`] -- [`RunControl`]: stop requests, tick pacing, tick limit.
//! - [`runner`] -- [`run_simulation`], the async tick loop.
//! - [`error`] -- [`TickError`] and [`SimulationError`].
//!
//! [`run_simulation`]: runner::run_simulation

mod behavior;
pub mod config;
pub mod control;
pub mod error;
pub mod listener;
pub mod runner;
pub mod scheduler;
pub mod simulation;
pub mod stats;

pub use config::{ConfigError, SimulationConfig};
pub use control::{RunControl, SimulationEndReason};
pub use error::{SimulationError, TickError};
pub use listener::{CountingListener, PopulationCounts, PopulationListener};
pub use runner::{
    NoOpCallback, RunnerError, SimulationResult, TickCallback, log_simulation_end, run_simulation,
};
pub use scheduler::Scheduler;
pub use simulation::{Simulation, TickSummary};
