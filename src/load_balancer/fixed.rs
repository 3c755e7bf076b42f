//! Fixed host selection.

use crate::load_balancer::LoadBalancer;

/// Always selects the same host (host 0 by default).
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedHost {
    index: u8,
}

impl FixedHost {
    pub fn new(index: u8) -> Self {
        Self { index }
    }
}

impl LoadBalancer for FixedHost {
    fn next_host(&self, host_count: u8) -> u8 {
        // Fall back to host 0 if the pinned index is outside the pool.
        if self.index < host_count {
            self.index
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_host() {
        let lb = FixedHost::default();
        assert_eq!(lb.next_host(8), 0);
        assert_eq!(lb.next_host(8), 0);

        assert_eq!(FixedHost::new(5).next_host(8), 5);
        assert_eq!(FixedHost::new(5).next_host(4), 0);
    }
}
