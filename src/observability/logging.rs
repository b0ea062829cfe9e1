//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Map the configured minimum level onto a tracing filter
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - The subscriber is built from an explicit level passed in by `main`;
//!   `RUST_LOG` overrides it when set

use serde::{Deserialize, Serialize};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Minimum severity that is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Directive understood by `EnvFilter`.
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Filter scoped to this crate at this level.
    pub fn filter(&self) -> EnvFilter {
        EnvFilter::new(format!("forward_proxy={}", self.as_directive()))
    }
}

/// Install the global subscriber.
///
/// Fails if a subscriber is already installed.
pub fn init(level: LogLevel) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| level.filter());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}
