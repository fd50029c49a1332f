//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Listener identities are unique and parseable
//! - Durations are non-zero
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GroupConfig → Result<(), Vec<ValidationError>>

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::schema::GroupConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("at least one listener must be configured")]
    NoListeners,

    #[error("listener address {0} is configured more than once")]
    DuplicateAddress(String),

    #[error("listener address {address} is not a socket address: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("shutdown.grace_period_ms must be greater than zero")]
    ZeroGracePeriod,

    #[error("shutdown.timeout_ms must be greater than zero when set")]
    ZeroShutdownTimeout,
}

/// Check a configuration before it is accepted.
pub fn validate_config(config: &GroupConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listeners.is_empty() {
        errors.push(ValidationError::NoListeners);
    }

    let mut seen = HashSet::new();
    for listener in &config.listeners {
        let address = &listener.bind_address;
        if let Err(e) = address.parse::<SocketAddr>() {
            errors.push(ValidationError::InvalidAddress {
                address: address.clone(),
                reason: e.to_string(),
            });
        }
        if !seen.insert(address.as_str()) {
            errors.push(ValidationError::DuplicateAddress(address.clone()));
        }
    }

    if config.shutdown.grace_period_ms == 0 {
        errors.push(ValidationError::ZeroGracePeriod);
    }
    if config.shutdown.timeout_ms == Some(0) {
        errors.push(ValidationError::ZeroShutdownTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
