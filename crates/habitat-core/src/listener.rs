//! Population listeners.
//!
//! A listener observes births, deaths, and tick ends without being able to
//! change anything. Listeners are notified after the mutators have run for
//! the same event.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use habitat_agents::Agent;
use habitat_types::{DeathCause, PopulationStats, ReproductionMode};

/// Observer of population changes.
pub trait PopulationListener: Send {
    /// An agent entered the simulation.
    fn on_spawn(&mut self, _agent: &Agent, _mode: ReproductionMode) {}

    /// An agent died. Its cell is already free.
    fn on_death(&mut self, _agent: &Agent, _cause: DeathCause) {}

    /// A tick finished.
    fn on_tick(&mut self, _stats: &PopulationStats) {}
}

/// Event totals shared between a [`CountingListener`] and its readers.
#[derive(Debug, Default)]
pub struct PopulationCounts {
    seeded: AtomicU64,
    born: AtomicU64,
    died: AtomicU64,
    ticks: AtomicU64,
}

impl PopulationCounts {
    /// Agents placed without parents.
    pub fn seeded(&self) -> u64 {
        self.seeded.load(Ordering::Acquire)
    }

    /// Agents born to one or two parents.
    pub fn born(&self) -> u64 {
        self.born.load(Ordering::Acquire)
    }

    /// Agents that died.
    pub fn died(&self) -> u64 {
        self.died.load(Ordering::Acquire)
    }

    /// Ticks observed.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }
}

/// Counts population events into a shared [`PopulationCounts`].
#[derive(Debug, Clone, Default)]
pub struct CountingListener {
    counts: Arc<PopulationCounts>,
}

impl CountingListener {
    /// Create a listener with zeroed counts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for reading the totals after the listener is registered.
    pub fn counts(&self) -> Arc<PopulationCounts> {
        Arc::clone(&self.counts)
    }
}

impl PopulationListener for CountingListener {
    fn on_spawn(&mut self, _agent: &Agent, mode: ReproductionMode) {
        let counter = match mode {
            ReproductionMode::Seeded => &self.counts.seeded,
            ReproductionMode::Asexual | ReproductionMode::Sexual => &self.counts.born,
        };
        counter.fetch_add(1, Ordering::AcqRel);
    }

    fn on_death(&mut self, _agent: &Agent, _cause: DeathCause) {
        self.counts.died.fetch_add(1, Ordering::AcqRel);
    }

    fn on_tick(&mut self, _stats: &PopulationStats) {
        self.counts.ticks.fetch_add(1, Ordering::AcqRel);
    }
}
