//! Backend registry: the single owner of shared balancer state.
//!
//! # Responsibilities
//! - Hold the static backend list (fixed at startup, index-stable)
//! - Track per-backend health and quarantine deadlines
//! - Track per-backend inflight session counts
//! - Own the shared rotation cursor used by selection
//! - Establish outbound connections, quarantining on failure
//!
//! # Design Decisions
//! - All dynamic state lives behind one mutex, so every mutation (health
//!   flip, mark-down, inflight adjust, cursor advance) is serialized with
//!   respect to concurrent sessions
//! - Health heals lazily: a quarantined backend becomes eligible the first
//!   time an availability check observes its deadline has passed; there is
//!   no background timer
//! - Callers never see raw state, only the operations below

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tokio::net::TcpStream;

use crate::balancer::error::SessionError;
use crate::config::BackendConfig;

/// One upstream server the balancer may route sessions to. Immutable.
#[derive(Debug, Clone)]
pub struct Backend {
    pub host: String,
    pub port: u16,
    /// Position in the configured backend list; stable for the process
    /// lifetime and used as the backend's identity everywhere.
    pub index: usize,
}

impl Backend {
    /// The `host:port` form used for connects and log lines.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Dynamic state, guarded as one unit.
#[derive(Debug)]
struct RegistryState {
    healthy: Vec<bool>,
    unavailable_until: Vec<Instant>,
    inflight: Vec<usize>,
    cursor: usize,
}

/// Owner of the backend pool and its health/inflight bookkeeping.
#[derive(Debug)]
pub struct Registry {
    backends: Vec<Backend>,
    quarantine: Duration,
    state: Mutex<RegistryState>,
}

impl Registry {
    /// Build a registry from the configured backend list.
    ///
    /// Config validation guarantees the list is nonempty.
    pub fn new(configs: &[BackendConfig], quarantine: Duration) -> Self {
        let backends: Vec<Backend> = configs
            .iter()
            .enumerate()
            .map(|(index, config)| Backend {
                host: config.host.clone(),
                port: config.port,
                index,
            })
            .collect();

        let n = backends.len();
        let now = Instant::now();
        Self {
            backends,
            quarantine,
            state: Mutex::new(RegistryState {
                healthy: vec![true; n],
                unavailable_until: vec![now; n],
                inflight: vec![0; n],
                cursor: 0,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().expect("registry state lock poisoned")
    }

    /// Number of configured backends.
    pub fn backend_count(&self) -> usize {
        self.backends.len()
    }

    /// Look up a backend by index.
    pub fn backend(&self, index: usize) -> &Backend {
        &self.backends[index]
    }

    /// Flip any quarantined backend whose deadline has passed back to
    /// healthy. No other side effect.
    pub fn refresh_health(&self) {
        self.refresh_health_at(Instant::now());
    }

    fn refresh_health_at(&self, now: Instant) {
        let mut state = self.state();
        for index in 0..self.backends.len() {
            if !state.healthy[index] && now >= state.unavailable_until[index] {
                state.healthy[index] = true;
                tracing::info!(backend = index, addr = %self.backends[index].addr(),
                    "quarantine expired; backend eligible again");
            }
        }
    }

    /// Indices of currently healthy backends, in static configuration
    /// order. Refreshes health first.
    pub fn available_indices(&self) -> Vec<usize> {
        self.available_indices_at(Instant::now())
    }

    fn available_indices_at(&self, now: Instant) -> Vec<usize> {
        self.refresh_health_at(now);
        let state = self.state();
        (0..self.backends.len())
            .filter(|&index| state.healthy[index])
            .collect()
    }

    /// Quarantine a backend: excluded from selection until the configured
    /// quarantine duration has elapsed.
    pub fn mark_down(&self, index: usize) {
        self.mark_down_at(index, Instant::now());
    }

    fn mark_down_at(&self, index: usize, now: Instant) {
        let mut state = self.state();
        state.healthy[index] = false;
        state.unavailable_until[index] = now + self.quarantine;
    }

    /// Attempt an outbound connection to the given backend.
    ///
    /// On failure the backend is quarantined as a side effect and a
    /// transient [`SessionError::Connect`] is returned.
    pub async fn connect(&self, index: usize) -> Result<TcpStream, SessionError> {
        let backend = &self.backends[index];
        match TcpStream::connect((backend.host.as_str(), backend.port)).await {
            Ok(stream) => Ok(stream),
            Err(source) => {
                self.mark_down(index);
                tracing::warn!(
                    backend = index,
                    addr = %backend.addr(),
                    quarantine_secs = self.quarantine.as_secs(),
                    error = %source,
                    "backend connect failed; marking down"
                );
                Err(SessionError::Connect {
                    index,
                    addr: backend.addr(),
                    source,
                })
            }
        }
    }

    /// Adjust a backend's active-session count. The count is never allowed
    /// to go negative.
    pub fn adjust_inflight(&self, index: usize, delta: isize) {
        let mut state = self.state();
        let count = &mut state.inflight[index];
        if delta >= 0 {
            *count += delta as usize;
        } else {
            let dec = delta.unsigned_abs();
            debug_assert!(*count >= dec, "inflight underflow on backend {}", index);
            *count = count.saturating_sub(dec);
        }
    }

    /// Record a committed session against a backend. The returned guard
    /// restores the count exactly once when dropped.
    pub fn track_session(self: &Arc<Self>, index: usize) -> InflightGuard {
        self.adjust_inflight(index, 1);
        InflightGuard {
            registry: Arc::clone(self),
            index,
        }
    }

    /// Copy of all inflight counts, for least-connections selection and
    /// log lines.
    pub fn inflight_snapshot(&self) -> Vec<usize> {
        self.state().inflight.clone()
    }

    /// Return the current rotation cursor and step it by one (mod N).
    ///
    /// Called exactly once per selection request, whatever the selection's
    /// outcome, so the cursor value depends only on how many selections
    /// have been issued since start.
    pub fn advance_cursor(&self) -> usize {
        let mut state = self.state();
        let current = state.cursor;
        state.cursor = (state.cursor + 1) % self.backends.len();
        current
    }
}

/// RAII guard for a backend's inflight count.
///
/// Created on successful connect; decrements on drop, which makes the
/// decrement happen exactly once however the session ends.
#[derive(Debug)]
pub struct InflightGuard {
    registry: Arc<Registry>,
    index: usize,
}

impl InflightGuard {
    /// Index of the backend this session committed to.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        self.registry.adjust_inflight(self.index, -1);
    }
}
