//! Per-tick population statistics.

use std::collections::BTreeMap;

use habitat_agents::{Agent, MutatorRegistry};
use habitat_types::{AgentType, PopulationStats, TypeStats};
use habitat_world::Environment;

/// Aggregate living agents per type and pull every logging mutator's
/// columns.
pub fn collect<'a>(
    tick: u64,
    agents: impl IntoIterator<Item = &'a Agent>,
    agent_types: usize,
    mutators: &MutatorRegistry,
    environment: &Environment,
) -> PopulationStats {
    let mut per_type: Vec<TypeStats> = (0..agent_types)
        .map(|index| TypeStats {
            agent_type: AgentType(index),
            ..TypeStats::default()
        })
        .collect();

    for agent in agents {
        if !agent.is_alive() {
            continue;
        }
        if let Some(row) = per_type.get_mut(agent.agent_type().index()) {
            row.population = row.population.saturating_add(1);
            row.total_energy = row
                .total_energy
                .saturating_add(i64::from(agent.energy()));
        }
    }

    let mut total_extra: BTreeMap<String, i64> = BTreeMap::new();
    for row in &mut per_type {
        for (column, value) in mutators.log_columns(row.agent_type, environment) {
            let entry = row.extra.entry(column.to_owned()).or_insert(0);
            *entry = entry.saturating_add(value);
            let total = total_extra.entry(column.to_owned()).or_insert(0);
            *total = total.saturating_add(value);
        }
    }

    let total_population = per_type
        .iter()
        .fold(0_u64, |acc, row| acc.saturating_add(row.population));
    let total_energy = per_type
        .iter()
        .fold(0_i64, |acc, row| acc.saturating_add(row.total_energy));

    PopulationStats {
        tick,
        per_type,
        total_population,
        total_energy,
        total_extra,
    }
}
