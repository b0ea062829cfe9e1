//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (buffer sizes > 0, timeouts > 0)
//! - Check addresses parse before anything binds
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.read_buffer_size must be greater than 0")]
    ZeroReadBuffer,

    #[error("listener.max_header_bytes ({max}) must be at least read_buffer_size ({buffer})")]
    HeaderLimitBelowBuffer { max: usize, buffer: usize },

    #[error("listener.max_connections must be greater than 0 when set")]
    ZeroConnectionLimit,

    #[error("timeouts.{0} must be greater than 0 when set")]
    ZeroTimeout(&'static str),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Check a configuration for semantic errors.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let listener = &config.listener;

    if listener.read_buffer_size == 0 {
        errors.push(ValidationError::ZeroReadBuffer);
    }
    if listener.max_header_bytes < listener.read_buffer_size {
        errors.push(ValidationError::HeaderLimitBelowBuffer {
            max: listener.max_header_bytes,
            buffer: listener.read_buffer_size,
        });
    }
    if listener.max_connections == Some(0) {
        errors.push(ValidationError::ZeroConnectionLimit);
    }

    if config.timeouts.connect_secs == Some(0) {
        errors.push(ValidationError::ZeroTimeout("connect_secs"));
    }
    if config.timeouts.idle_secs == Some(0) {
        errors.push(ValidationError::ZeroTimeout("idle_secs"));
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            observability.metrics_address.clone(),
        ));
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

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&ProxyConfig::default()).is_ok());
    }

    #[test]
    fn reports_every_violation() {
        let mut config = ProxyConfig::default();
        config.listener.read_buffer_size = 0;
        config.listener.max_connections = Some(0);
        config.timeouts.connect_secs = Some(0);
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "not-an-address".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::ZeroReadBuffer,
                ValidationError::ZeroConnectionLimit,
                ValidationError::ZeroTimeout("connect_secs"),
                ValidationError::InvalidMetricsAddress("not-an-address".into()),
            ]
        );
    }

    #[test]
    fn header_limit_must_cover_one_read() {
        let mut config = ProxyConfig::default();
        config.listener.max_header_bytes = 1024;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::HeaderLimitBelowBuffer { max: 1024, buffer: 4096 }]
        );
    }
}
