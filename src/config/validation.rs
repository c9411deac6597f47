//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (ports valid, limits > 0)
//! - Reject configurations the balancer cannot run with
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: BalancerConfig → Result<(), Vec<ValidationError>>
//! - Runs once at startup; the backend set is fixed for the process lifetime

use std::net::SocketAddr;

use crate::config::schema::BalancerConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The listener bind address is not a valid socket address.
    InvalidBindAddress(String),
    /// The listener connection limit is zero.
    ZeroMaxConnections,
    /// No backends were configured.
    NoBackends,
    /// A backend has an empty host or a zero port.
    InvalidBackend { index: usize, reason: String },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidBindAddress(addr) => {
                write!(f, "invalid bind address '{}'", addr)
            }
            ValidationError::ZeroMaxConnections => {
                write!(f, "listener.max_connections must be greater than zero")
            }
            ValidationError::NoBackends => write!(f, "at least one backend is required"),
            ValidationError::InvalidBackend { index, reason } => {
                write!(f, "backend {}: {}", index, reason)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &BalancerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroMaxConnections);
    }

    if config.backends.is_empty() {
        errors.push(ValidationError::NoBackends);
    }

    for (index, backend) in config.backends.iter().enumerate() {
        if backend.host.is_empty() {
            errors.push(ValidationError::InvalidBackend {
                index,
                reason: "empty host".to_string(),
            });
        }
        if backend.port == 0 {
            errors.push(ValidationError::InvalidBackend {
                index,
                reason: "port must be nonzero".to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::BackendConfig;

    fn valid_config() -> BalancerConfig {
        let mut config = BalancerConfig::default();
        config.listener.bind_address = "127.0.0.1:9000".to_string();
        config.backends.push(BackendConfig {
            host: "127.0.0.1".to_string(),
            port: 18861,
        });
        config
    }

    #[test]
    fn accepts_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn rejects_empty_backend_list() {
        let mut config = valid_config();
        config.backends.clear();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::NoBackends));
    }

    #[test]
    fn rejects_bad_bind_address() {
        let mut config = valid_config();
        config.listener.bind_address = "not-an-address".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(
            errors[0],
            ValidationError::InvalidBindAddress(_)
        ));
    }

    #[test]
    fn collects_multiple_errors() {
        let mut config = valid_config();
        config.listener.max_connections = 0;
        config.backends[0].port = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
