//! Async driver for [`Simulation::tick`].
//!
//! [`run_simulation`] ticks until the population dies out, the tick limit
//! is reached, or a stop is requested. Each tick runs to completion before
//! any of these is checked.

use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use tracing::{info, warn};

use crate::control::{RunControl, SimulationEndReason};
use crate::error::TickError;
use crate::simulation::{Simulation, TickSummary};

/// Errors that end a run early.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick failed; the simulation is left as it was mid-tick.
    #[error("tick failed: {source}")]
    Tick {
        /// What went wrong inside the tick.
        #[from]
        source: TickError,
    },
}

/// How a run went.
#[derive(Debug, Clone, Copy)]
pub struct SimulationResult {
    /// Which condition ended the loop.
    pub end_reason: SimulationEndReason,
    /// Summary of the last tick this run executed.
    pub final_summary: Option<TickSummary>,
    /// Ticks executed by this call.
    pub total_ticks: u64,
    /// Wall-clock time spent in the run.
    pub elapsed: TimeDelta,
}

/// Observer called once per completed tick.
pub trait TickCallback: Send {
    /// Runs after the tick is applied, before any stop check.
    fn on_tick(&mut self, summary: &TickSummary, simulation: &Simulation);
}

/// Ignores every tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _simulation: &Simulation) {}
}

/// Tick `simulation` until it dies out, hits its tick limit, or is stopped.
///
/// # Errors
///
/// Returns [`RunnerError::Tick`] as soon as a tick fails.
pub async fn run_simulation(
    simulation: &mut Simulation,
    control: &Arc<RunControl>,
    callback: &mut dyn TickCallback,
) -> Result<SimulationResult, RunnerError> {
    let started = Utc::now();
    info!(
        tick = simulation.time(),
        population = simulation.population(),
        max_ticks = control.max_ticks(),
        "Run starting"
    );

    let mut final_summary = None;
    let mut total_ticks: u64 = 0;
    let end_reason = loop {
        if control.is_stop_requested() {
            break SimulationEndReason::StopRequested;
        }

        let summary = simulation.tick()?;
        total_ticks = total_ticks.saturating_add(1);
        final_summary = Some(summary);
        callback.on_tick(&summary, simulation);

        if let Some(reason) = end_condition(control, &summary) {
            break reason;
        }
        match control.tick_interval() {
            Some(interval) => tokio::time::sleep(interval).await,
            None => tokio::task::yield_now().await,
        }
    };

    Ok(SimulationResult {
        end_reason,
        final_summary,
        total_ticks,
        elapsed: Utc::now().signed_duration_since(started),
    })
}

/// The simulation's own reasons to stop after a tick. Extinction wins over
/// the tick limit when both happen on the same tick.
const fn end_condition(control: &RunControl, summary: &TickSummary) -> Option<SimulationEndReason> {
    if summary.agents_alive == 0 {
        Some(SimulationEndReason::Extinction)
    } else if control.is_last_tick(summary.tick) {
        Some(SimulationEndReason::TickLimit)
    } else {
        None
    }
}

/// Log one line describing the end of a run.
pub fn log_simulation_end(result: &SimulationResult) {
    let elapsed_ms = result.elapsed.num_milliseconds();
    match result.final_summary {
        Some(last) => info!(
            reason = %result.end_reason,
            ticks = result.total_ticks,
            last_tick = last.tick,
            population = last.agents_alive,
            births = last.births,
            deaths = last.deaths,
            elapsed_ms,
            "Run ended"
        ),
        None => warn!(reason = %result.end_reason, elapsed_ms, "Run ended before its first tick"),
    }
}
