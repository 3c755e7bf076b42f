//! Round-robin host selection.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::load_balancer::LoadBalancer;

/// Round-robin selector.
/// Stores an internal counter to rotate through hosts.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoadBalancer for RoundRobin {
    fn next_host(&self, host_count: u8) -> u8 {
        let count = usize::from(host_count.max(1));
        let start = self.counter.fetch_add(1, Ordering::Relaxed);
        // count <= u8::MAX, so the remainder always fits.
        (start % count) as u8
    }
}
