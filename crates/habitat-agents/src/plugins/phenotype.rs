//! Heritable phenotype genes.
//!
//! Each configured gene is one byte linked to an agent parameter. The
//! parameter is multiplied by `gene / 128` when the agent spawns, so 128
//! leaves it unchanged, 64 halves it and 255 nearly doubles it. Seeded
//! agents start from the per-type initial values; children combine their
//! parents' genes through the configured [`MeiosisMode`] and then flip each
//! bit with the mutation rate.

use std::any::Any;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use habitat_types::AgentType;
use habitat_world::SimRng;
use habitat_world::rng::roll;

use crate::agent::Agent;
use crate::config::AgentParameter;
use crate::error::AgentError;
use crate::mutator::{Mutator, MutatorContext, Parents, SpawnMutator};

/// Gene value that leaves its parameter unchanged.
pub const NEUTRAL_GENE: u8 = 128;

/// Multiplier a gene applies to its parameter.
pub fn expression(gene: u8) -> f64 {
    f64::from(gene) / f64::from(NEUTRAL_GENE)
}

/// How two parents' genes combine into a child's.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeiosisMode {
    /// The child takes the mean of the two values.
    #[default]
    Average,
    /// Every bit comes from a randomly chosen parent.
    Recombine,
    /// Every whole gene comes from a randomly chosen parent.
    Swap,
}

impl MeiosisMode {
    fn combine(self, a: u8, b: u8, rng: &mut SimRng) -> u8 {
        match self {
            Self::Average => a.midpoint(b),
            Self::Recombine => {
                let mask: u8 = rng.random();
                (a & mask) | (b & !mask)
            }
            Self::Swap => {
                if rng.random::<bool>() {
                    a
                } else {
                    b
                }
            }
        }
    }
}

/// One gene and the parameter it controls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneParams {
    /// The parameter this gene scales.
    #[serde(default)]
    pub parameter: AgentParameter,

    /// Starting value per agent type for seeded agents.
    #[serde(default)]
    pub initial: Vec<u8>,
}

/// The `phenotype` configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhenotypeParams {
    /// Genes carried by every agent. Empty disables the mutator.
    #[serde(default)]
    pub genes: Vec<GeneParams>,

    /// How two-parent children combine their parents' genes.
    #[serde(default)]
    pub meiosis: MeiosisMode,

    /// Chance each gene bit flips when passed to a child.
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
}

impl Default for PhenotypeParams {
    fn default() -> Self {
        Self {
            genes: Vec::new(),
            meiosis: MeiosisMode::default(),
            mutation_rate: default_mutation_rate(),
        }
    }
}

impl PhenotypeParams {
    /// Give genes without initial values the neutral value for every type.
    pub fn resize(&mut self, agent_types: usize) {
        for gene in &mut self.genes {
            if gene.initial.is_empty() {
                gene.initial = vec![NEUTRAL_GENE; agent_types];
            }
        }
    }
}

/// An agent's genes, kept in its extension bag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneState {
    /// One value per configured gene.
    pub genes: Vec<u8>,
}

fn genes_of(agent: &Agent) -> Option<&[u8]> {
    agent
        .extensions()
        .get::<GeneState>()
        .map(|state| state.genes.as_slice())
}

/// Gives every agent heritable genes and expresses them once, at spawn.
#[derive(Debug)]
pub struct PhenotypeMutator {
    params: PhenotypeParams,
}

impl PhenotypeMutator {
    /// Create the mutator from a resized [`PhenotypeParams`].
    pub const fn new(params: PhenotypeParams) -> Self {
        Self { params }
    }

    fn initial_genes(&self, agent_type: AgentType) -> Result<Vec<u8>, AgentError> {
        self.params
            .genes
            .iter()
            .map(|gene| {
                gene.initial
                    .get(agent_type.index())
                    .copied()
                    .ok_or(AgentError::UnknownAgentType {
                        agent_type,
                        configured: gene.initial.len(),
                    })
            })
            .collect()
    }

    fn mutate(&self, genes: &mut [u8], rng: &mut SimRng) {
        for gene in genes {
            for bit in 0..8 {
                if roll(rng, self.params.mutation_rate) {
                    *gene ^= 1_u8 << bit;
                }
            }
        }
    }

    fn inherit(
        &self,
        agent_type: AgentType,
        parents: Parents<'_>,
        rng: &mut SimRng,
    ) -> Result<Vec<u8>, AgentError> {
        let mut genes = match parents {
            Parents::Seeded => return self.initial_genes(agent_type),
            Parents::Asexual(parent) => match genes_of(parent) {
                Some(genes) => genes.to_vec(),
                None => self.initial_genes(agent_type)?,
            },
            Parents::Sexual(first, second) => match (genes_of(first), genes_of(second)) {
                (Some(a), Some(b)) => a
                    .iter()
                    .zip(b)
                    .map(|(&a, &b)| self.params.meiosis.combine(a, b, rng))
                    .collect(),
                (Some(genes), None) | (None, Some(genes)) => genes.to_vec(),
                (None, None) => self.initial_genes(agent_type)?,
            },
        };
        self.mutate(&mut genes, rng);
        Ok(genes)
    }
}

impl SpawnMutator for PhenotypeMutator {
    fn on_spawn(
        &mut self,
        agent: &mut Agent,
        parents: Parents<'_>,
        ctx: &mut MutatorContext<'_>,
    ) -> Result<(), AgentError> {
        let genes = self.inherit(agent.agent_type(), parents, ctx.rng)?;
        for (gene, binding) in genes.iter().zip(&self.params.genes) {
            if let Some(value) = binding.parameter.get(agent.params()) {
                binding.parameter
                    .set(agent.params_mut(), value * expression(*gene));
            }
        }
        trace!(agent_id = %agent.id(), genes = ?genes, "Genes expressed");
        agent.extensions_mut().insert(GeneState { genes });
        Ok(())
    }
}

impl Mutator for PhenotypeMutator {
    fn name(&self) -> &'static str {
        "phenotype"
    }

    fn as_spawn(&mut self) -> Option<&mut dyn SpawnMutator> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_mutation_rate() -> f64 {
    0.01
}
