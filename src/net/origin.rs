//! Outbound connections to origin servers.

use std::time::Duration;
use tokio::net::TcpStream;

use crate::error::ProxyError;
use crate::observability::metrics;
use crate::resilience::timeouts::with_timeout;

/// Open a TCP connection to `host:port`, resolving the name if needed.
pub async fn connect(host: &str, port: u16, timeout: Option<Duration>) -> Result<TcpStream, ProxyError> {
    match with_timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(stream) => {
            tracing::debug!(host, port, "Connected to origin");
            Ok(stream)
        }
        Err(source) => {
            metrics::record_upstream_failure("connect");
            let addr = if host.contains(':') {
                format!("[{}]:{}", host, port)
            } else {
                format!("{}:{}", host, port)
            };
            Err(ProxyError::UpstreamConnect { addr, source })
        }
    }
}
