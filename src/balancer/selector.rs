//! Backend selection.
//!
//! # Responsibilities
//! - Produce an ordered candidate list for a new session
//! - Apply the configured policy (round-robin or least-connections)
//! - Rotate fairly via the registry's shared cursor
//!
//! # Design Decisions
//! - The selector reads availability and inflight counts from the registry
//!   and never mutates health state; the only state it touches is the
//!   rotation cursor, consumed once per selection whatever the outcome
//! - An empty candidate list is the "no backend available" signal; the
//!   caller turns it into a session error
//! - Least-connections returns the minimal-inflight tied subset ONLY. If
//!   every backend in that subset fails to connect the session fails even
//!   though higher-load backends remain healthy; broadening the retry tier
//!   would change failover behaviour, so it is kept as is

use std::sync::Arc;

use crate::balancer::registry::Registry;
use crate::config::Policy;

/// Orders candidates for new sessions according to the configured policy.
#[derive(Debug)]
pub struct Selector {
    registry: Arc<Registry>,
    policy: Policy,
}

impl Selector {
    pub fn new(registry: Arc<Registry>, policy: Policy) -> Self {
        Self { registry, policy }
    }

    /// The policy this selector applies.
    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Ordered backend indices to try for a new session. Empty means no
    /// backend is available.
    pub fn candidates(&self) -> Vec<usize> {
        let available = self.registry.available_indices();
        // Consumed even when nothing is available.
        let start = self.registry.advance_cursor();

        if available.is_empty() {
            return Vec::new();
        }

        match self.policy {
            Policy::RoundRobin => rotate_from(&available, start, self.registry.backend_count()),
            Policy::LeastConnections => {
                let inflight = self.registry.inflight_snapshot();
                let min = available
                    .iter()
                    .map(|&index| inflight[index])
                    .min()
                    .expect("available list is nonempty");
                let tied: Vec<usize> = available
                    .iter()
                    .copied()
                    .filter(|&index| inflight[index] == min)
                    .collect();
                rotate_from(&tied, start, self.registry.backend_count())
            }
        }
    }
}

/// Rotate `order` so that the first index at or after `start` (scanning the
/// full index space `0..n` cyclically) comes first, preserving the relative
/// order of the rest.
fn rotate_from(order: &[usize], start: usize, n: usize) -> Vec<usize> {
    for offset in 0..n {
        let wanted = (start + offset) % n;
        if let Some(pos) = order.iter().position(|&index| index == wanted) {
            let mut rotated = Vec::with_capacity(order.len());
            rotated.extend_from_slice(&order[pos..]);
            rotated.extend_from_slice(&order[..pos]);
            return rotated;
        }
    }
    order.to_vec()
}
