//! The tick clock and ordered client registry.
//!
//! Clients are visited in registration order. [`Scheduler::begin_tick`]
//! advances time and hands back a snapshot of the registry, so clients
//! added or removed while a tick runs do not change who is visited in that
//! tick: new clients start on the next tick, removed clients stay in the
//! snapshot and are skipped by the caller's liveness check.

/// Ordered registry of schedulable clients plus the global time counter.
#[derive(Debug, Clone)]
pub struct Scheduler<C> {
    clients: Vec<C>,
    time: u64,
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Self {
            clients: Vec::new(),
            time: 0,
        }
    }
}

impl<C: Copy + PartialEq> Scheduler<C> {
    /// Create an empty scheduler at time 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time. 0 before the first tick.
    pub const fn time(&self) -> u64 {
        self.time
    }

    /// Register a client for future ticks. Registering twice is a no-op.
    pub fn add(&mut self, client: C) {
        if !self.clients.contains(&client) {
            self.clients.push(client);
        }
    }

    /// Deregister a client. Returns whether it was registered.
    pub fn remove(&mut self, client: C) -> bool {
        let before = self.clients.len();
        self.clients.retain(|c| *c != client);
        self.clients.len() != before
    }

    /// Whether a client is registered.
    pub fn contains(&self, client: C) -> bool {
        self.clients.contains(&client)
    }

    /// Number of registered clients.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Whether no client is registered.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Registered clients in visiting order.
    pub fn clients(&self) -> &[C] {
        &self.clients
    }

    /// Advance time by one and return the clients to visit this tick.
    pub fn begin_tick(&mut self) -> Vec<C> {
        self.time = self.time.saturating_add(1);
        self.clients.clone()
    }

    /// Drop every client and rewind time to 0.
    pub fn reset(&mut self) {
        self.clients.clear();
        self.time = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_registration_order() {
        let mut s = Scheduler::new();
        s.add(3_u64);
        s.add(1);
        s.add(2);
        s.add(1);
        assert_eq!(s.clients(), &[3, 1, 2]);
    }

    #[test]
    fn removing_unknown_client_is_noop() {
        let mut s = Scheduler::new();
        s.add(1_u64);
        assert!(!s.remove(9));
        assert!(s.remove(1));
        assert!(s.is_empty());
    }

    #[test]
    fn snapshot_ignores_mid_tick_changes() {
        let mut s = Scheduler::new();
        s.add(1_u64);
        s.add(2);
        let visit = s.begin_tick();
        s.add(3);
        s.remove(2);
        assert_eq!(visit, vec![1, 2]);
        assert_eq!(s.time(), 1);
        assert_eq!(s.begin_tick(), vec![1, 3]);
        assert_eq!(s.time(), 2);
    }

    #[test]
    fn reset_rewinds_time() {
        let mut s = Scheduler::new();
        s.add(1_u64);
        s.begin_tick();
        s.reset();
        assert_eq!(s.time(), 0);
        assert!(!s.contains(1));
    }
}
