//! Stop requests and pacing for a running simulation.
//!
//! The engine shares one [`RunControl`] between the tick loop and its
//! Ctrl-C task. A stop request is only honoured between ticks.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::config::WorldConfig;

/// Why [`run_simulation`](crate::runner::run_simulation) returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationEndReason {
    /// The tick named by `world.max_ticks` has run.
    TickLimit,
    /// [`RunControl::request_stop`] was called.
    StopRequested,
    /// The last agent died.
    Extinction,
}

impl fmt::Display for SimulationEndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::TickLimit => "tick limit",
            Self::StopRequested => "stop requested",
            Self::Extinction => "extinction",
        };
        f.write_str(text)
    }
}

/// Run bounds plus a stop flag that may be set from another task.
#[derive(Debug)]
pub struct RunControl {
    stop: AtomicBool,
    tick_interval_ms: u64,
    max_ticks: u64,
}

impl RunControl {
    /// `max_ticks` of 0 runs until stopped or extinct.
    pub const fn new(tick_interval_ms: u64, max_ticks: u64) -> Self {
        Self {
            stop: AtomicBool::new(false),
            tick_interval_ms,
            max_ticks,
        }
    }

    /// Bounds from the `world` section.
    pub const fn from_config(world: &WorldConfig) -> Self {
        Self::new(world.tick_interval_ms, world.max_ticks)
    }

    /// Stop before the next tick starts.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Whether [`request_stop`](Self::request_stop) has been called.
    pub fn is_stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// Pause between ticks, or `None` to run them back to back.
    pub const fn tick_interval(&self) -> Option<Duration> {
        if self.tick_interval_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.tick_interval_ms))
        }
    }

    /// Configured tick limit, 0 for none.
    pub const fn max_ticks(&self) -> u64 {
        self.max_ticks
    }

    /// Whether `tick` is the last one the limit allows.
    pub const fn is_last_tick(&self, tick: u64) -> bool {
        self.max_ticks != 0 && tick >= self.max_ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_flag_latches() {
        let control = RunControl::new(0, 0);
        assert!(!control.is_stop_requested());
        control.request_stop();
        control.request_stop();
        assert!(control.is_stop_requested());
    }

    #[test]
    fn zero_interval_means_no_pause() {
        assert_eq!(RunControl::new(0, 0).tick_interval(), None);
        assert_eq!(
            RunControl::new(25, 0).tick_interval(),
            Some(Duration::from_millis(25))
        );
    }

    #[test]
    fn tick_limit_is_inclusive() {
        let unbounded = RunControl::new(0, 0);
        assert!(!unbounded.is_last_tick(u64::MAX));
        let bounded = RunControl::new(0, 10);
        assert!(!bounded.is_last_tick(9));
        assert!(bounded.is_last_tick(10));
    }

    #[test]
    fn world_section_sets_bounds() {
        let world = WorldConfig {
            tick_interval_ms: 5,
            max_ticks: 7,
            ..WorldConfig::default()
        };
        let control = RunControl::from_config(&world);
        assert_eq!(control.max_ticks(), 7);
        assert_eq!(control.tick_interval(), Some(Duration::from_millis(5)));
    }

    #[test]
    fn end_reasons_read_as_words() {
        assert_eq!(SimulationEndReason::TickLimit.to_string(), "tick limit");
        assert_eq!(SimulationEndReason::Extinction.to_string(), "extinction");
    }
}
