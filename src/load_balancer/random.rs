//! Uniformly random host selection.

use rand::Rng;

use crate::load_balancer::LoadBalancer;

/// Picks a uniformly random host for every request.
#[derive(Debug, Default)]
pub struct RandomHost;

impl RandomHost {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for RandomHost {
    fn next_host(&self, host_count: u8) -> u8 {
        rand::thread_rng().gen_range(0..host_count.max(1))
    }
}
