//! Simulation binary for Habitat.
//!
//! Loads the configuration, builds and seeds the simulation, and runs the
//! tick loop until the tick limit, extinction, or Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from the path given as the first argument, or
//!    `habitat-config.yaml` in the working directory
//! 2. Initialize structured logging (tracing), honouring `RUST_LOG`
//! 3. Build the simulation (validates the config, seeds stones, agents,
//!    and food)
//! 4. Create run control from the `world` section
//! 5. Install the Ctrl-C handler
//! 6. Run the simulation loop
//! 7. Log the result and final statistics

mod error;
mod stats_callback;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use habitat_core::{RunControl, Simulation, SimulationConfig, log_simulation_end, run_simulation};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::stats_callback::{StatsCallback, log_stats};

const DEFAULT_CONFIG_PATH: &str = "habitat-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if the configuration is unreadable or inconsistent,
/// or if a tick fails.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration. Logging is not up yet, so remember whether
    //    the defaults were used and report it afterwards.
    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let (config, found) = load_config(&config_path)?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("habitat-engine starting");
    if found {
        info!(path = %config_path.display(), "Configuration loaded");
    } else {
        warn!(path = %config_path.display(), "Config file not found, using defaults");
    }
    info!(
        seed = config.world.seed,
        width = config.topology.width,
        height = config.topology.height,
        wrap = config.topology.wrap,
        agent_types = config.agent_types.len(),
        food_types = config.food_types.len(),
        "World configuration"
    );

    // 3. Build the simulation.
    let stats_interval = config.logging.stats_interval;
    let control = Arc::new(RunControl::from_config(&config.world));
    let mut simulation = Simulation::new(config)?;
    info!(
        agents = simulation.population(),
        mutators = ?simulation.mutators().names(),
        "Simulation seeded"
    );

    // 4. Stop at the next tick boundary on Ctrl-C.
    {
        let control = Arc::clone(&control);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Ctrl-C received, stopping after the current tick");
                    control.request_stop();
                }
                Err(e) => {
                    warn!(error = %e, "failed to listen for Ctrl-C");
                }
            }
        });
    }

    // 5. Run.
    let mut callback = StatsCallback::new(stats_interval);
    let result = run_simulation(&mut simulation, &control, &mut callback).await?;

    // 6. Log results.
    log_simulation_end(&result);
    log_stats(&simulation.stats());
    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        elapsed_ms = result.elapsed.num_milliseconds(),
        "habitat-engine shutdown complete"
    );

    Ok(())
}

/// Load the configuration, falling back to defaults when the file does not
/// exist. The flag reports whether the file was found.
fn load_config(path: &Path) -> Result<(SimulationConfig, bool), EngineError> {
    if path.exists() {
        Ok((SimulationConfig::from_file(path)?, true))
    } else {
        Ok((SimulationConfig::default(), false))
    }
}
