//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! balancer. All types derive Serde traits for deserialization from
//! config files. Everything here is static for the process lifetime;
//! there is no hot reload.

use serde::{Deserialize, Serialize};

/// Root configuration for the load balancer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BalancerConfig {
    /// Listener configuration (bind address, connection limit).
    pub listener: ListenerConfig,

    /// Backend selection policy.
    pub policy: Policy,

    /// Quarantine duration applied after a failed connect, in seconds.
    pub quarantine_secs: u64,

    /// Backend server definitions, in selection-index order.
    pub backends: Vec<BackendConfig>,
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            policy: Policy::default(),
            quarantine_secs: default_quarantine_secs(),
            backends: Vec::new(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:9000").
    pub bind_address: String,

    /// Maximum concurrent client connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:9000".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Backend selection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Policy {
    /// Rotate through available backends in configuration order.
    #[default]
    RoundRobin,
    /// Prefer backends with the fewest active sessions.
    LeastConnections,
}

impl std::fmt::Display for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Policy::RoundRobin => write!(f, "round-robin"),
            Policy::LeastConnections => write!(f, "least-connections"),
        }
    }
}

/// A single backend server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Backend hostname or IP address.
    pub host: String,

    /// Backend TCP port.
    pub port: u16,
}

fn default_quarantine_secs() -> u64 {
    10
}

impl BalancerConfig {
    /// Quarantine duration as a [`std::time::Duration`].
    pub fn quarantine(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.quarantine_secs)
    }
}
