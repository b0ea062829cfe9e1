//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::observability::logging::LogLevel;

/// Root configuration for the forward proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, read limits).
    pub listener: ListenerConfig,

    /// Response cache settings.
    pub cache: CacheConfig,

    /// Optional I/O timeouts.
    pub timeouts: TimeoutConfig,

    /// Shutdown behaviour for in-flight connections.
    pub shutdown: ShutdownConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// Port to listen on.
    pub port: u16,

    /// Optional cap on concurrent connections. Unbounded when unset.
    pub max_connections: Option<usize>,

    /// Size of each socket read.
    pub read_buffer_size: usize,

    /// Upper bound on bytes read while waiting for the request header block.
    pub max_header_bytes: usize,
}

impl ListenerConfig {
    /// Address string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_connections: None,
            read_buffer_size: 4096,
            max_header_bytes: 64 * 1024,
        }
    }
}

/// Response cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether lookups and stores are performed at startup.
    pub enabled: bool,

    /// TTL for responses without caching headers.
    pub default_ttl_secs: i64,

    /// TTL for responses carrying an `Expires` header.
    pub expires_ttl_secs: i64,

    /// Responses larger than this are relayed but not cached.
    pub max_cacheable_bytes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_ttl_secs: 300,
            expires_ttl_secs: 3600,
            max_cacheable_bytes: 8 * 1024 * 1024,
        }
    }
}

/// Timeout configuration. Every timeout is disabled unless set.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Origin connection establishment timeout in seconds.
    pub connect_secs: Option<u64>,

    /// Maximum wait for a single read on either side, in seconds.
    pub idle_secs: Option<u64>,
}

impl TimeoutConfig {
    pub fn connect(&self) -> Option<Duration> {
        self.connect_secs.map(Duration::from_secs)
    }

    pub fn idle(&self) -> Option<Duration> {
        self.idle_secs.map(Duration::from_secs)
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Wait for in-flight connections instead of dropping them.
    pub drain: bool,

    /// Upper bound on the drain wait in seconds.
    pub drain_timeout_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain: false,
            drain_timeout_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Minimum log level.
    pub log_level: LogLevel,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: ProxyConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.port, 8080);
        assert_eq!(config.listener.read_buffer_size, 4096);
        assert!(config.listener.max_connections.is_none());
        assert!(config.cache.enabled);
        assert_eq!(config.cache.default_ttl_secs, 300);
        assert_eq!(config.cache.expires_ttl_secs, 3600);
        assert!(config.timeouts.connect().is_none());
        assert!(!config.shutdown.drain);
        assert_eq!(config.observability.log_level, LogLevel::Info);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [listener]
            port = 3128

            [cache]
            enabled = false

            [timeouts]
            connect_secs = 5

            [observability]
            log_level = "warning"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.port, 3128);
        assert_eq!(config.listener.host, "0.0.0.0");
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.default_ttl_secs, 300);
        assert_eq!(config.timeouts.connect(), Some(Duration::from_secs(5)));
        assert!(config.timeouts.idle().is_none());
        assert_eq!(config.observability.log_level, LogLevel::Warning);
    }

    #[test]
    fn bind_address_brackets_ipv6() {
        let mut listener = ListenerConfig::default();
        assert_eq!(listener.bind_address(), "0.0.0.0:8080");
        listener.host = "::1".into();
        assert_eq!(listener.bind_address(), "[::1]:8080");
    }
}
