//! Error types for per-connection proxy operations.
//!
//! Every variant is contained to the connection it occurred on; none of
//! them reach the process exit path.

use thiserror::Error;

/// Unified error type for handler and tunnel operations.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// I/O error on the client or origin socket.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CONNECT target without a usable `host:port`.
    #[error("Invalid CONNECT target: '{0}'")]
    InvalidConnectTarget(String),

    /// Failed to connect to the origin server.
    #[error("Failed to connect to upstream '{addr}': {source}")]
    UpstreamConnect {
        /// The address we tried to connect to.
        addr: String,
        #[source]
        source: std::io::Error,
    },
}
