//! Load balancing core.
//!
//! # Data Flow
//! ```text
//! Accepted connection → proxy session
//!     → selector.rs (ordered candidate list for the configured policy)
//!         → registry.rs (availability, inflight snapshot, cursor)
//!     → registry.rs connect() over candidates until one succeeds
//!     → inflight guard held for the session's lifetime
//! ```
//!
//! # Design Decisions
//! - The registry is the only component allowed to mutate shared state
//! - Selection produces an explicit ordered list consumed by a plain loop;
//!   failover never relies on unwinding
//! - A backend that fails a connect is quarantined for a fixed window and
//!   heals lazily on the next availability check after the deadline

pub mod error;
pub mod registry;
pub mod selector;

pub use error::SessionError;
pub use registry::{Backend, InflightGuard, Registry};
pub use selector::Selector;
