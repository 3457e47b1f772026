//! Lookup-table controller with an evolvable byte genome.
//!
//! The agent's situation is packed into a 9-bit index:
//!
//! | Bits | Input |
//! |------|-------|
//! | 0-1  | energy bucket relative to the breeding threshold |
//! | 2-4  | what the agent faces ([`Sensed::code`](crate::controller::Sensed::code)) |
//! | 5-6  | facing direction |
//! | 7    | memory register set |
//! | 8    | message received |
//!
//! The genome byte at that index is the decision: bits 0-1 select the
//! action, bit 2 sets memory, bit 3 sets the outgoing message, bit 4 asks
//! for asexual reproduction. Children inherit the genome with per-bit
//! mutation; two-parent children take a single-point crossover first.

use rand::Rng;
use serde::{Deserialize, Serialize};

use habitat_types::Action;
use habitat_world::SimRng;
use habitat_world::rng::roll;

use crate::controller::{Controller, ControllerInput, Decision};

/// Number of distinct situations, and therefore genome bytes.
pub const GENOME_LEN: usize = 512;

/// Settings for genetic controllers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneticParams {
    /// Chance each genome bit flips when copied into a child.
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
}

impl Default for GeneticParams {
    fn default() -> Self {
        Self {
            mutation_rate: default_mutation_rate(),
        }
    }
}

const fn default_mutation_rate() -> f64 {
    0.001
}

/// A controller whose policy is a byte genome lookup table.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneticController {
    genome: Vec<u8>,
    mutation_rate: f64,
}

impl GeneticController {
    /// Create a controller with a uniformly random genome.
    pub fn random(params: &GeneticParams, rng: &mut SimRng) -> Self {
        let genome = (0..GENOME_LEN).map(|_| rng.random::<u8>()).collect();
        Self {
            genome,
            mutation_rate: params.mutation_rate,
        }
    }

    /// Create a controller from an explicit genome.
    pub const fn from_genome(genome: Vec<u8>, mutation_rate: f64) -> Self {
        Self {
            genome,
            mutation_rate,
        }
    }

    /// The genome bytes.
    pub fn genome_bytes(&self) -> &[u8] {
        &self.genome
    }

    fn mutated(&self, genome: Vec<u8>, rng: &mut SimRng) -> Self {
        let genome = genome
            .into_iter()
            .map(|byte| {
                let mut out = byte;
                for bit in 0..8 {
                    if roll(rng, self.mutation_rate) {
                        out ^= 1_u8 << bit;
                    }
                }
                out
            })
            .collect();
        Self::from_genome(genome, self.mutation_rate)
    }
}

/// Pack the controller input into a genome index.
pub fn situation_index(input: &ControllerInput) -> usize {
    let energy = i64::from(input.energy);
    let breed = i64::from(input.breed_energy);
    let bucket: usize = if energy.saturating_mul(4) < breed {
        0
    } else if energy.saturating_mul(2) < breed {
        1
    } else if energy < breed {
        2
    } else {
        3
    };
    let ahead = usize::from(input.ahead.code());
    let facing = usize::from(input.facing.ordinal());
    let memory = usize::from(input.memory > 0.5);
    let comm = usize::from(input.comm_inbox > 0.0);
    bucket | (ahead << 2) | (facing << 5) | (memory << 7) | (comm << 8)
}

/// Decode a genome byte into a decision.
pub const fn decode(byte: u8) -> Decision {
    Decision {
        action: Action::from_bits(byte),
        memory: Some(if byte & 0b100 == 0 { 0.0 } else { 1.0 }),
        comm_outbox: Some(if byte & 0b1000 == 0 { 0.0 } else { 1.0 }),
        reproduce_asex: byte & 0b1_0000 != 0,
    }
}

impl Controller for GeneticController {
    fn control_agent(&mut self, input: &ControllerInput, _rng: &mut SimRng) -> Decision {
        let byte = self
            .genome
            .get(situation_index(input))
            .copied()
            .unwrap_or(0b11);
        decode(byte)
    }

    fn create_child_asexual(&self, rng: &mut SimRng) -> Box<dyn Controller> {
        Box::new(self.mutated(self.genome.clone(), rng))
    }

    fn create_child_sexual(
        &self,
        partner: &dyn Controller,
        rng: &mut SimRng,
    ) -> Box<dyn Controller> {
        let Some(other) = partner.genome().filter(|g| g.len() == self.genome.len()) else {
            return self.create_child_asexual(rng);
        };
        let point = rng.random_range(0..=self.genome.len());
        let crossed: Vec<u8> = self
            .genome
            .iter()
            .take(point)
            .chain(other.iter().skip(point))
            .copied()
            .collect();
        Box::new(self.mutated(crossed, rng))
    }

    fn genome(&self) -> Option<&[u8]> {
        Some(&self.genome)
    }

    fn kind(&self) -> &'static str {
        "genetic"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use habitat_types::{AgentId, AgentType, Direction};
    use habitat_world::rng::seeded;

    use super::*;
    use crate::controller::{RandomController, Sensed};

    fn input(energy: i32, ahead: Sensed, facing: Direction) -> ControllerInput {
        ControllerInput {
            agent: AgentId(1),
            agent_type: AgentType(0),
            energy,
            breed_energy: 100,
            facing,
            ahead,
            memory: 0.0,
            comm_inbox: 0.0,
            age: 0,
            pregnant: false,
        }
    }

    #[test]
    fn index_fits_genome() {
        let mut seen = std::collections::BTreeSet::new();
        for energy in [0, 30, 60, 200] {
            for facing in Direction::ALL {
                let i = situation_index(&input(energy, Sensed::Agent { same_type: true }, facing));
                assert!(i < GENOME_LEN);
                seen.insert(i);
            }
        }
        assert_eq!(seen.len(), 16);
    }

    #[test]
    fn decode_bits() {
        let d = decode(0b1_1110);
        assert_eq!(d.action, Action::StepForward);
        assert_eq!(d.memory, Some(1.0));
        assert_eq!(d.comm_outbox, Some(1.0));
        assert!(d.reproduce_asex);
        assert!(!decode(0).reproduce_asex);
    }

    #[test]
    fn lookup_follows_genome() {
        let mut genome = vec![0_u8; GENOME_LEN];
        let situation = input(200, Sensed::Nothing, Direction::East);
        if let Some(slot) = genome.get_mut(situation_index(&situation)) {
            *slot = 2;
        }
        let mut c = GeneticController::from_genome(genome, 0.0);
        let mut rng = seeded(4);
        assert_eq!(
            c.control_agent(&situation, &mut rng).action,
            Action::StepForward
        );
        let other = input(0, Sensed::Nothing, Direction::East);
        assert_eq!(c.control_agent(&other, &mut rng).action, Action::TurnLeft);
    }

    #[test]
    fn zero_mutation_copies_exactly() {
        let mut rng = seeded(8);
        let parent = GeneticController::random(
            &GeneticParams {
                mutation_rate: 0.0,
            },
            &mut rng,
        );
        let child = parent.create_child_asexual(&mut rng);
        assert_eq!(child.genome(), Some(parent.genome_bytes()));
    }

    #[test]
    fn crossover_takes_bytes_from_both_parents() {
        let mut rng = seeded(12);
        let a = GeneticController::from_genome(vec![0_u8; GENOME_LEN], 0.0);
        let b = GeneticController::from_genome(vec![0xFF_u8; GENOME_LEN], 0.0);
        let child = a.create_child_sexual(&b, &mut rng);
        let genome = child.genome().unwrap();
        let zeros = genome.iter().take_while(|g| **g == 0).count();
        assert!(genome.iter().skip(zeros).all(|g| *g == 0xFF));
    }

    #[test]
    fn incompatible_partner_falls_back_to_copy() {
        let mut rng = seeded(3);
        let a = GeneticController::from_genome(vec![7_u8; GENOME_LEN], 0.0);
        let child = a.create_child_sexual(&RandomController, &mut rng);
        assert_eq!(child.genome(), Some(a.genome_bytes()));
    }
}
