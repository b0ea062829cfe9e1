//! Startup orchestration.
//!
//! # Responsibilities
//! - Load configuration (file optional)
//! - Apply the positional port argument over the configured port
//!
//! # Design Decisions
//! - An unparsable port is not fatal: warn and keep the configured port
//! - Subsystems initialize in order, listener last

use std::path::Path;

use crate::config::{load_config, ConfigError, ProxyConfig};

/// Outcome of interpreting the positional port argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortArg {
    Omitted,
    Valid(u16),
    Invalid(String),
}

impl PortArg {
    pub fn parse(arg: Option<&str>) -> Self {
        match arg {
            None => PortArg::Omitted,
            Some(raw) => match raw.trim().parse::<u16>() {
                Ok(port) => PortArg::Valid(port),
                Err(_) => PortArg::Invalid(raw.to_string()),
            },
        }
    }
}

/// Load the config file if given, otherwise use defaults.
pub fn load(path: Option<&Path>) -> Result<ProxyConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => Ok(ProxyConfig::default()),
    }
}

/// Apply the positional port argument to `config`.
pub fn apply_port_arg(config: &mut ProxyConfig, arg: Option<&str>) {
    match PortArg::parse(arg) {
        PortArg::Omitted => {}
        PortArg::Valid(port) => config.listener.port = port,
        PortArg::Invalid(raw) => {
            tracing::warn!(
                argument = %raw,
                port = config.listener.port,
                "Invalid port number; using default port"
            );
        }
    }
}
