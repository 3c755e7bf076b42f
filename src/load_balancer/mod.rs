//! Upstream host selection.
//!
//! # Data Flow
//! ```text
//! Alias route matched (/tianditu/*)
//!     → HostPolicy from config
//!     → selector picks index in [0, host_count):
//!         - fixed.rs (always the same host)
//!         - random.rs (uniform per request)
//!         - round_robin.rs (rotate through hosts)
//!     → TargetResolver builds t{index}.<domain>
//! ```
//!
//! # Design Decisions
//! - One selector per deployment, built once from config
//! - Numbered routes (/t{N}/) and tile shorthand never consult a selector

pub mod fixed;
pub mod random;
pub mod round_robin;

use crate::config::HostPolicy;

pub use fixed::FixedHost;
pub use random::RandomHost;
pub use round_robin::RoundRobin;

/// Picks one of `host_count` numbered upstream hosts.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    /// Returns an index in `0..host_count`. `host_count` is never zero.
    fn next_host(&self, host_count: u8) -> u8;
}

/// Build the selector for a configured policy.
pub fn from_policy(policy: HostPolicy) -> Box<dyn LoadBalancer> {
    match policy {
        HostPolicy::Fixed => Box::new(FixedHost::default()),
        HostPolicy::Random => Box::new(RandomHost::new()),
        HostPolicy::RoundRobin => Box::new(RoundRobin::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_policy_stays_in_range() {
        for policy in [HostPolicy::Fixed, HostPolicy::Random, HostPolicy::RoundRobin] {
            let lb = from_policy(policy);
            for _ in 0..64 {
                assert!(lb.next_host(8) < 8, "{:?} out of range", policy);
                assert_eq!(lb.next_host(1), 0);
            }
        }
    }
}
