//! Connection proxying subsystem.
//!
//! # Data Flow
//! ```text
//! server.rs binds, accepts, spawns one task per connection
//!     → session.rs waits for the first client chunk (lazy connect)
//!     → selector produces candidates; registry connects with failover
//!     → relay.rs pumps bytes both ways until EOF or error
//!     → teardown: inflight restored, completion logged, slot released
//! ```
//!
//! The proxy is protocol-agnostic: payload bytes are never parsed.

pub mod relay;
pub mod server;
pub mod session;

pub use server::{Server, ServerError};
