//! Per-food-type growth settings.

use serde::{Deserialize, Serialize};

/// Growth and seeding parameters for one food type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodParams {
    /// Food cells placed on random empty cells when the simulation is built.
    #[serde(default = "default_initial_food")]
    pub initial_food: u32,

    /// Chance per tick that each existing food cell spreads to a random
    /// empty neighbour.
    #[serde(default = "default_grow_chance")]
    pub grow_chance: f64,

    /// Chance per tick that one new food cell appears on a random empty cell.
    #[serde(default = "default_drop_rate")]
    pub drop_rate: f64,
}

impl Default for FoodParams {
    fn default() -> Self {
        Self {
            initial_food: default_initial_food(),
            grow_chance: default_grow_chance(),
            drop_rate: default_drop_rate(),
        }
    }
}

const fn default_initial_food() -> u32 {
    20
}

const fn default_grow_chance() -> f64 {
    0.01
}

const fn default_drop_rate() -> f64 {
    0.1
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_uses_defaults() {
        let params: FoodParams = serde_yml::from_str("{}").unwrap();
        assert_eq!(params, FoodParams::default());
    }

    #[test]
    fn partial_yaml_overrides() {
        let params: FoodParams = serde_yml::from_str("grow_chance: 0.5\n").unwrap();
        assert_eq!(params.initial_food, 20);
        assert!((params.grow_chance - 0.5).abs() < f64::EPSILON);
    }
}
