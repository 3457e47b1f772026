//! Tick callback that logs population statistics.
//!
//! Every `interval` ticks the callback collects [`PopulationStats`] from the
//! simulation and emits one `info!` line per agent type plus a total. The
//! mutator columns (`sick`, `products`, ...) are logged as a JSON object.

use habitat_core::{Simulation, TickCallback, TickSummary};
use habitat_types::PopulationStats;
use tracing::{debug, info};

/// Callback that logs statistics at a fixed tick interval.
#[derive(Debug, Clone, Copy)]
pub struct StatsCallback {
    interval: u64,
}

impl StatsCallback {
    /// Log every `interval` ticks. 0 disables statistics logging.
    pub const fn new(interval: u64) -> Self {
        Self { interval }
    }

    /// Whether statistics are due after `tick`.
    pub const fn is_due(&self, tick: u64) -> bool {
        match tick.checked_rem(self.interval) {
            Some(rem) => rem == 0,
            None => false,
        }
    }
}

impl TickCallback for StatsCallback {
    fn on_tick(&mut self, summary: &TickSummary, simulation: &Simulation) {
        debug!(
            tick = summary.tick,
            agents_alive = summary.agents_alive,
            births = summary.births,
            deaths = summary.deaths,
            "Tick complete"
        );
        if self.is_due(summary.tick) {
            log_stats(&simulation.stats());
        }
    }
}

/// Emit one line per agent type and one for the whole population.
pub fn log_stats(stats: &PopulationStats) {
    for row in &stats.per_type {
        info!(
            tick = stats.tick,
            agent_type = %row.agent_type,
            population = row.population,
            total_energy = row.total_energy,
            extra = %columns_json(&row.extra),
            "Type statistics"
        );
    }
    info!(
        tick = stats.tick,
        population = stats.total_population,
        total_energy = stats.total_energy,
        extra = %columns_json(&stats.total_extra),
        "Population statistics"
    );
}

fn columns_json(columns: &std::collections::BTreeMap<String, i64>) -> String {
    serde_json::to_string(columns).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn due_every_interval() {
        let callback = StatsCallback::new(10);
        assert!(!callback.is_due(1));
        assert!(!callback.is_due(9));
        assert!(callback.is_due(10));
        assert!(callback.is_due(20));
    }

    #[test]
    fn zero_interval_never_logs() {
        let callback = StatsCallback::new(0);
        assert!(!callback.is_due(0));
        assert!(!callback.is_due(100));
    }

    #[test]
    fn columns_render_as_json_object() {
        let mut columns = BTreeMap::new();
        columns.insert("sick".to_owned(), 3);
        columns.insert("products".to_owned(), 1);
        assert_eq!(columns_json(&columns), r#"{"products":1,"sick":3}"#);
        assert_eq!(columns_json(&BTreeMap::new()), "{}");
    }
}
