//! Abiotic factors.
//!
//! A factor is a smooth field laid over the grid, such as temperature on
//! an island that is warm in the middle and cold at sea. Each agent type
//! prefers one value per factor. The summed distance between the preferred
//! and the local values is the agent's discomfort, and it scales one of the
//! agent's parameters by `1 + sensitivity * discomfort`.
//!
//! The scaled parameter is recomputed after every update from the value it
//! had at spawn, so the effect follows the agent as it moves.

use std::any::Any;

use serde::{Deserialize, Serialize};
use tracing::trace;

use habitat_types::{AgentType, Location};
use habitat_world::Topology;

use crate::agent::Agent;
use crate::config::AgentParameter;
use crate::error::AgentError;
use crate::mutator::{Mutator, MutatorContext, Parents, SpawnMutator, UpdateMutator};

/// An island: `center` inside an ellipse, `outside` beyond it, with a
/// logistic edge.
///
/// Positions and sizes are fractions of the grid's width and height.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IslandFactor {
    /// Value at the island's centre.
    #[serde(default = "default_center")]
    pub center: f64,

    /// Value far from the island.
    #[serde(default)]
    pub outside: f64,

    /// Island width.
    #[serde(default = "default_size")]
    pub size_x: f64,

    /// Island height.
    #[serde(default = "default_size")]
    pub size_y: f64,

    /// Centre column.
    #[serde(default = "default_position_x")]
    pub position_x: f64,

    /// Centre row.
    #[serde(default = "default_position_y")]
    pub position_y: f64,

    /// Edge hardness; larger values make a sharper coastline.
    #[serde(default = "default_transition")]
    pub transition: f64,
}

impl Default for IslandFactor {
    fn default() -> Self {
        Self {
            center: default_center(),
            outside: 0.0,
            size_x: default_size(),
            size_y: default_size(),
            position_x: default_position_x(),
            position_y: default_position_y(),
            transition: default_transition(),
        }
    }
}

impl IslandFactor {
    /// Field value at the unit-square point `(x, y)`.
    pub fn value(&self, x: f64, y: f64) -> f64 {
        let dx = (x - self.position_x) / (self.size_x / 2.0);
        let dy = (y - self.position_y) / (self.size_y / 2.0);
        let distance = 1.0 - dx.mul_add(dx, dy * dy);
        let inside = (1.0 / (1.0 + (-distance * 10.0 * self.transition).exp())).clamp(0.0, 1.0);
        self.center.mul_add(inside, self.outside * (1.0 - inside))
    }

    /// Field value at the centre of a grid cell.
    pub fn value_at(&self, location: Location, topology: &Topology) -> f64 {
        let x = (f64::from(location.x) + 0.5) / f64::from(topology.width());
        let y = (f64::from(location.y) + 0.5) / f64::from(topology.height());
        self.value(x, y)
    }
}

/// How one agent type reacts to the factors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbioticAgentParams {
    /// Preferred value per factor. Missing entries prefer 0.
    #[serde(default)]
    pub preferred: Vec<f64>,

    /// The parameter discomfort scales.
    #[serde(default)]
    pub parameter: AgentParameter,

    /// Extra multiplier per unit of discomfort.
    #[serde(default)]
    pub sensitivity: f64,
}

/// The `abiotic` configuration section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbioticParams {
    /// The fields. Empty disables the mutator.
    #[serde(default)]
    pub factors: Vec<IslandFactor>,

    /// One row per agent type.
    #[serde(default)]
    pub agents: Vec<AbioticAgentParams>,
}

impl AbioticParams {
    /// Give every agent type a row and every row one preference per factor.
    pub fn resize(&mut self, agent_types: usize) {
        if self.agents.is_empty() {
            self.agents = vec![AbioticAgentParams::default(); agent_types];
        }
        let factors = self.factors.len();
        for row in &mut self.agents {
            if row.preferred.len() < factors {
                row.preferred.resize(factors, 0.0);
            }
        }
    }
}

/// What the abiotic mutator keeps in an agent's extension bag.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AbioticState {
    /// The parameter before any abiotic scaling.
    pub base: Option<f64>,
    /// Discomfort at the agent's last update.
    pub discomfort: f64,
}

/// Scales agent parameters by how far the local factors are from what the
/// agent's type prefers.
#[derive(Debug)]
pub struct AbioticMutator {
    params: AbioticParams,
}

impl AbioticMutator {
    /// Create the mutator from a resized [`AbioticParams`].
    pub const fn new(params: AbioticParams) -> Self {
        Self { params }
    }

    fn row(&self, agent_type: AgentType) -> Result<&AbioticAgentParams, AgentError> {
        self.params
            .agents
            .get(agent_type.index())
            .ok_or(AgentError::UnknownAgentType {
                agent_type,
                configured: self.params.agents.len(),
            })
    }

    /// Summed distance from the preferred values at `location`.
    pub fn discomfort(
        &self,
        agent_type: AgentType,
        location: Location,
        topology: &Topology,
    ) -> Result<f64, AgentError> {
        let row = self.row(agent_type)?;
        let total = self
            .params
            .factors
            .iter()
            .enumerate()
            .map(|(i, factor)| {
                let preferred = row.preferred.get(i).copied().unwrap_or(0.0);
                (factor.value_at(location, topology) - preferred).abs()
            })
            .sum();
        Ok(total)
    }

    fn apply(&self, agent: &mut Agent, topology: &Topology) -> Result<(), AgentError> {
        let discomfort = self.discomfort(agent.agent_type(), agent.location(), topology)?;
        let row = self.row(agent.agent_type())?;
        let state = agent
            .extensions()
            .get::<AbioticState>()
            .copied()
            .unwrap_or_default();
        if let Some(base) = state.base {
            let scaled = base * discomfort.mul_add(row.sensitivity, 1.0);
            row.parameter.set(agent.params_mut(), scaled);
        }
        agent.extensions_mut().insert(AbioticState {
            discomfort,
            ..state
        });
        Ok(())
    }
}

impl SpawnMutator for AbioticMutator {
    fn on_spawn(
        &mut self,
        agent: &mut Agent,
        _parents: Parents<'_>,
        ctx: &mut MutatorContext<'_>,
    ) -> Result<(), AgentError> {
        let base = self.row(agent.agent_type())?.parameter.get(agent.params());
        agent.extensions_mut().insert(AbioticState {
            base,
            discomfort: 0.0,
        });
        self.apply(agent, ctx.environment.topology())
    }
}

impl UpdateMutator for AbioticMutator {
    fn on_update(&mut self, agent: &mut Agent, ctx: &mut MutatorContext<'_>) -> Result<(), AgentError> {
        self.apply(agent, ctx.environment.topology())?;
        trace!(agent_id = %agent.id(), location = %agent.location(), "Abiotic effect applied");
        Ok(())
    }
}

impl Mutator for AbioticMutator {
    fn name(&self) -> &'static str {
        "abiotic"
    }

    fn as_spawn(&mut self) -> Option<&mut dyn SpawnMutator> {
        Some(self)
    }

    fn as_update(&mut self) -> Option<&mut dyn UpdateMutator> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_center() -> f64 {
    1.0
}

const fn default_size() -> f64 {
    0.5
}

const fn default_position_x() -> f64 {
    0.4
}

const fn default_position_y() -> f64 {
    0.5
}

const fn default_transition() -> f64 {
    0.3
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use habitat_types::{AgentId, Direction, LocationDirection};
    use habitat_world::Environment;
    use habitat_world::rng::seeded;

    use super::*;
    use crate::config::AgentParams;
    use crate::controller::RandomController;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    /// A hard-edged island covering the middle of the grid.
    fn island() -> IslandFactor {
        IslandFactor {
            center: 1.0,
            outside: 0.0,
            size_x: 0.5,
            size_y: 0.5,
            position_x: 0.5,
            position_y: 0.5,
            transition: 10.0,
        }
    }

    fn walker(at: Location) -> Agent {
        Agent::new(
            AgentId(1),
            AgentType(0),
            LocationDirection::new(at, Direction::East),
            AgentParams {
                step_energy: 2,
                ..AgentParams::default()
            },
            Box::new(RandomController),
            0,
        )
    }

    #[test]
    fn island_is_high_inside_and_low_outside() {
        let factor = island();
        assert!(factor.value(0.5, 0.5) > 0.99);
        assert!(factor.value(0.0, 0.0) < 0.01);
        // On the coastline the logistic edge sits halfway.
        assert!(close(factor.value(0.75, 0.5), 0.5));
    }

    #[test]
    fn default_island_matches_documented_shape() {
        let factor = IslandFactor::default();
        let centre = factor.value(0.4, 0.5);
        assert!(centre > 0.9 && centre < 1.0);
        assert!(factor.value(0.4, 0.5) > factor.value(0.9, 0.5));
    }

    #[test]
    fn resize_fills_rows_and_preferences() {
        let mut params = AbioticParams {
            factors: vec![island(), island()],
            agents: Vec::new(),
        };
        params.resize(3);
        assert_eq!(params.agents.len(), 3);
        assert!(params.agents.iter().all(|row| row.preferred == vec![0.0, 0.0]));
    }

    #[test]
    fn parameter_follows_the_agent() {
        let mut env = Environment::new(Topology::new(10, 10, false).unwrap(), 1, 1);
        let mut rng = seeded(2);
        let mut m = AbioticMutator::new(AbioticParams {
            factors: vec![island()],
            agents: vec![AbioticAgentParams {
                preferred: vec![1.0],
                parameter: AgentParameter::StepEnergy,
                sensitivity: 2.0,
            }],
        });
        let mut ctx = MutatorContext {
            time: 0,
            rng: &mut rng,
            environment: &mut env,
        };

        // Born in the middle of the island: comfortable.
        let mut agent = walker(Location::new(5, 5));
        m.on_spawn(&mut agent, Parents::Seeded, &mut ctx).unwrap();
        assert_eq!(agent.params().step_energy, 2);
        let state = agent.extensions().get::<AbioticState>().copied().unwrap();
        assert_eq!(state.base, Some(2.0));
        assert!(state.discomfort < 0.01);

        // Out at sea discomfort is 1, so steps cost 3x.
        agent.set_position(LocationDirection::new(Location::new(0, 0), Direction::East));
        m.on_update(&mut agent, &mut ctx).unwrap();
        assert_eq!(agent.params().step_energy, 6);

        // Back home the original cost returns.
        agent.set_position(LocationDirection::new(Location::new(5, 5), Direction::East));
        m.on_update(&mut agent, &mut ctx).unwrap();
        assert_eq!(agent.params().step_energy, 2);
    }

    #[test]
    fn discomfort_sums_over_factors() {
        let topology = Topology::new(10, 10, false).unwrap();
        let m = AbioticMutator::new(AbioticParams {
            factors: vec![island(), island()],
            agents: vec![AbioticAgentParams {
                preferred: vec![0.0, 1.0],
                ..AbioticAgentParams::default()
            }],
        });
        let here = Location::new(5, 5);
        let one = island().value_at(here, &topology);
        let expected = one + (1.0 - one);
        let got = m.discomfort(AgentType(0), here, &topology).unwrap();
        assert!(close(got, expected));
        assert!(m.discomfort(AgentType(4), here, &topology).is_err());
    }
}
