//! Built-in mutators.

pub mod abiotic;
pub mod disease;
pub mod phenotype;
pub mod production;

pub use abiotic::{AbioticAgentParams, AbioticMutator, AbioticParams, AbioticState, IslandFactor};
pub use disease::DiseaseMutator;
pub use phenotype::{GeneParams, GeneState, MeiosisMode, PhenotypeMutator, PhenotypeParams};
pub use production::{ProductionMutator, ProductionState};
