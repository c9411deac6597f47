//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → BalancerConfig (validated, immutable)
//!     → consumed once at startup to build the registry and selector
//! ```
//!
//! # Design Decisions
//! - Config is immutable for the process lifetime; no reload
//! - All fields have defaults to allow minimal configs, but validation
//!   requires a nonempty backend list
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::BackendConfig;
pub use schema::BalancerConfig;
pub use schema::ListenerConfig;
pub use schema::Policy;
