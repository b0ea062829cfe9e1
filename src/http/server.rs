//! Proxy server: accept loop and connection task management.
//!
//! # Responsibilities
//! - Own the shared cache and per-connection settings
//! - Accept connections and spawn one handler task each
//! - Collect handler tasks so shutdown can drain or drop them
//!
//! # Design Decisions
//! - No ordering or coordination between connections
//! - Default shutdown drops in-flight connections; draining is opt-in
//! - Accept errors are logged and never stop the loop

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::Instrument;

use crate::cache::CacheStore;
use crate::config::ProxyConfig;
use crate::http::handler::{ConnectionHandler, HandlerSettings};
use crate::net::listener::{Listener, ListenerError};
use crate::observability::metrics;

/// Pause after a failed accept so a persistent error (e.g. EMFILE) does not spin.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(10);

/// Forward proxy server.
pub struct ProxyServer {
    config: ProxyConfig,
    cache: Arc<CacheStore>,
    settings: Arc<HandlerSettings>,
}

impl ProxyServer {
    /// Create a new server with the given configuration.
    pub fn new(config: ProxyConfig) -> Self {
        let cache = Arc::new(CacheStore::from_config(&config.cache));
        let settings = Arc::new(HandlerSettings::from_config(&config));
        Self {
            config,
            cache,
            settings,
        }
    }

    /// Bind the configured listener.
    pub async fn bind(&self) -> Result<Listener, ListenerError> {
        Listener::bind(&self.config.listener).await
    }

    /// The shared response cache, for administrative control.
    pub fn cache(&self) -> Arc<CacheStore> {
        self.cache.clone()
    }

    /// Accept connections until `shutdown` fires.
    pub async fn run(self, listener: Listener, mut shutdown: broadcast::Receiver<()>) {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(address = %addr, "Proxy server started");
        }

        let mut connections = JoinSet::new();
        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer, permit)) => {
                        metrics::record_connection();
                        let handler = ConnectionHandler::new(self.cache.clone(), self.settings.clone());
                        let span = tracing::info_span!(
                            "connection",
                            connection_id = %handler.id(),
                            peer_addr = %peer
                        );
                        connections.spawn(
                            async move {
                                let _permit = permit;
                                handler.run(stream).await;
                            }
                            .instrument(span),
                        );
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Accept failed");
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                },
                Some(finished) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = finished {
                        if e.is_panic() {
                            tracing::error!(error = %e, "Connection handler panicked");
                        }
                    }
                }
            }
        }

        drop(listener);
        self.finish(connections).await;
        tracing::info!("Proxy server stopped");
    }

    async fn finish(&self, mut connections: JoinSet<()>) {
        if connections.is_empty() {
            return;
        }

        let shutdown = &self.config.shutdown;
        if shutdown.drain {
            tracing::info!(in_flight = connections.len(), "Draining connections");
            let deadline = Duration::from_secs(shutdown.drain_timeout_secs);
            let drained = tokio::time::timeout(deadline, async {
                while connections.join_next().await.is_some() {}
            })
            .await;
            if drained.is_err() {
                tracing::warn!(remaining = connections.len(), "Drain timed out");
            }
        }

        if !connections.is_empty() {
            tracing::info!(dropped = connections.len(), "Dropping in-flight connections");
        }
        connections.shutdown().await;
    }
}
