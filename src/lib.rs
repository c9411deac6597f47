//! TCP stream load balancer.
//!
//! Distributes inbound TCP sessions across a fixed pool of backends,
//! quarantining backends that fail to connect and relaying bytes without
//! any protocol awareness.

pub mod balancer;
pub mod config;
pub mod proxy;

pub use balancer::{Registry, Selector, SessionError};
pub use config::BalancerConfig;
pub use proxy::Server;
