//! Per-connection request handling.
//!
//! # Responsibilities
//! - Read one request head from the client
//! - Classify it: CONNECT, GET (cache candidate) or anything else
//! - Serve cache hits, forward misses, hand CONNECT to the tunnel relay
//! - Stream origin responses back and record them for the cache
//!
//! # Design Decisions
//! - Reads loop until the blank line or `max_header_bytes`, so heads larger
//!   than one read buffer are not truncated
//! - The origin response is copied to the client chunk by chunk; recording
//!   for the cache never delays it
//! - A response is submitted to the cache once, when it is complete: its
//!   `Content-Length` body has arrived, or the origin closed when no length
//!   was declared. Headers alone are not enough, so a truncated body is
//!   never cached
//! - The header delimiter search resumes where the previous chunk ended
//! - Only the CONNECT path answers errors with a response; other failures
//!   just close the connection

use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::cache::CacheStore;
use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::message::{HeaderEnd, HeaderScanner};
use crate::http::request::{extract_host, extract_port};
use crate::http::{Request, Response};
use crate::net::connection::{ConnectionId, ConnectionState};
use crate::net::origin;
use crate::net::tunnel::{self, TunnelOptions};
use crate::observability::metrics;
use crate::resilience::timeouts::with_timeout;

/// Limits and timeouts applied to every connection.
#[derive(Debug, Clone)]
pub struct HandlerSettings {
    pub read_buffer_size: usize,
    pub max_header_bytes: usize,
    pub max_cacheable_bytes: usize,
    pub connect_timeout: Option<Duration>,
    pub idle_timeout: Option<Duration>,
}

impl Default for HandlerSettings {
    fn default() -> Self {
        Self::from_config(&ProxyConfig::default())
    }
}

impl HandlerSettings {
    pub fn from_config(config: &ProxyConfig) -> Self {
        Self {
            read_buffer_size: config.listener.read_buffer_size,
            max_header_bytes: config.listener.max_header_bytes,
            max_cacheable_bytes: config.cache.max_cacheable_bytes,
            connect_timeout: config.timeouts.connect(),
            idle_timeout: config.timeouts.idle(),
        }
    }

    fn tunnel_options(&self) -> TunnelOptions {
        TunnelOptions {
            buffer_size: self.read_buffer_size,
            connect_timeout: self.connect_timeout,
            idle_timeout: self.idle_timeout,
        }
    }
}

/// How a request is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Opaque tunnel; never touches the cache.
    Connect,
    /// Served from cache when possible, otherwise forwarded.
    Get,
    /// Forwarded unconditionally.
    Other,
}

impl Classification {
    pub fn of(request: &Request) -> Self {
        if request.is_connect() {
            Classification::Connect
        } else if request.is_get() {
            Classification::Get
        } else {
            Classification::Other
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Classification::Connect => "connect",
            Classification::Get => "get",
            Classification::Other => "other",
        }
    }
}

/// Drives a single client connection from first read to close.
pub struct ConnectionHandler {
    id: ConnectionId,
    cache: Arc<CacheStore>,
    settings: Arc<HandlerSettings>,
    state: ConnectionState,
}

impl ConnectionHandler {
    pub fn new(cache: Arc<CacheStore>, settings: Arc<HandlerSettings>) -> Self {
        Self {
            id: ConnectionId::new(),
            cache,
            settings,
            state: ConnectionState::ReceivingRequest,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    fn transition(&mut self, next: ConnectionState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {:?} -> {:?}",
            self.state,
            next
        );
        tracing::trace!(from = ?self.state, to = ?next, "State transition");
        self.state = next;
    }

    /// Serve the connection. Both sides are closed when this returns.
    pub async fn run<S>(mut self, mut client: S) -> ConnectionState
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let raw = match read_request_head(&mut client, &self.settings).await {
            Ok(raw) if !raw.is_empty() => raw,
            Ok(_) => {
                tracing::debug!("Client closed before sending a request");
                self.transition(ConnectionState::Closed);
                return self.state;
            }
            Err(e) => {
                tracing::debug!(error = %e, "Failed to read request");
                self.transition(ConnectionState::Closed);
                return self.state;
            }
        };

        let request = Request::parse(&raw);
        let class = Classification::of(&request);
        self.transition(ConnectionState::Classified);
        metrics::record_request(class.as_str());
        tracing::debug!(
            method = %request.method,
            target = %request.target,
            class = class.as_str(),
            "Received request"
        );

        match class {
            Classification::Connect => {
                self.transition(ConnectionState::Tunneling);
                let options = self.settings.tunnel_options();
                if let Err(e) = tunnel::open_tunnel(client, &request.target, &request.body, options).await {
                    tracing::warn!(error = %e, "Tunnel failed");
                }
            }
            Classification::Get => {
                if let Some(response) = self.cache.lookup(&request) {
                    self.transition(ConnectionState::ServingFromCache);
                    if let Err(e) = client.write_all(&response.to_bytes()).await {
                        tracing::debug!(error = %e, "Failed to write cached response");
                    }
                } else {
                    self.transition(ConnectionState::Forwarding);
                    self.forward_logged(&mut client, &request).await;
                }
                let _ = client.shutdown().await;
            }
            Classification::Other => {
                self.transition(ConnectionState::Forwarding);
                self.forward_logged(&mut client, &request).await;
                let _ = client.shutdown().await;
            }
        }

        self.transition(ConnectionState::Closed);
        self.state
    }

    async fn forward_logged<S>(&self, client: &mut S, request: &Request)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        match self.forward(client, request).await {
            Ok(bytes) => tracing::info!(bytes, "Request forwarding completed"),
            Err(e @ ProxyError::UpstreamConnect { .. }) => {
                tracing::error!(error = %e, "Failed to connect to target server")
            }
            Err(e) => tracing::warn!(error = %e, "Forwarding aborted"),
        }
    }

    /// Send the request to its origin and stream the response back.
    /// Returns the number of response bytes relayed.
    async fn forward<S>(&self, client: &mut S, request: &Request) -> Result<u64, ProxyError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let host = extract_host(request);
        let port = extract_port(request);
        tracing::info!(host = %host, port, "Forwarding request");

        let mut origin = origin::connect(&host, port, self.settings.connect_timeout).await?;
        origin.write_all(&request.to_bytes()).await?;

        let mut recorder = (request.is_get() && self.cache.is_enabled())
            .then(|| ResponseRecorder::new(self.settings.max_cacheable_bytes));

        let mut chunk = vec![0u8; self.settings.read_buffer_size.max(1)];
        let mut relayed: u64 = 0;
        loop {
            let n = match with_timeout(self.settings.idle_timeout, origin.read(&mut chunk)).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    tracing::debug!(error = %e, "Origin read ended");
                    break;
                }
            };
            client.write_all(&chunk[..n]).await?;
            relayed += n as u64;

            if let Some(rec) = recorder.as_mut() {
                if let Some(response) = rec.push(&chunk[..n]) {
                    self.cache.store(request, &response);
                    recorder = None;
                }
            }
        }

        if let Some(response) = recorder.and_then(ResponseRecorder::finish) {
            self.cache.store(request, &response);
        }
        Ok(relayed)
    }
}

/// Read from the client until the header block is complete, the client
/// stops sending, or `max_header_bytes` is reached.
async fn read_request_head<S>(client: &mut S, settings: &HandlerSettings) -> std::io::Result<Vec<u8>>
where
    S: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(settings.read_buffer_size);
    let mut chunk = vec![0u8; settings.read_buffer_size.max(1)];
    let mut scanner = HeaderScanner::new();

    loop {
        let n = with_timeout(settings.idle_timeout, client.read(&mut chunk)).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if scanner.advance(&buf).is_some() {
            break;
        }
        if buf.len() >= settings.max_header_bytes {
            tracing::warn!(
                bytes = buf.len(),
                limit = settings.max_header_bytes,
                "Request head exceeds limit; parsing what was read"
            );
            break;
        }
    }
    Ok(buf)
}

/// Accumulates an origin response alongside the client copy.
///
/// The response is complete once its header block has arrived and, if it
/// declares `Content-Length`, that many body bytes have too. Without a
/// declared length it completes when the origin closes.
struct ResponseRecorder {
    buf: Vec<u8>,
    limit: usize,
    scanner: HeaderScanner,
    head: Option<HeaderEnd>,
    content_length: Option<usize>,
    overflowed: bool,
}

impl ResponseRecorder {
    fn new(limit: usize) -> Self {
        Self {
            buf: Vec::new(),
            limit,
            scanner: HeaderScanner::new(),
            head: None,
            content_length: None,
            overflowed: false,
        }
    }

    /// Append a chunk; returns the response once it is complete.
    fn push(&mut self, bytes: &[u8]) -> Option<Response> {
        if self.overflowed {
            return None;
        }
        if self.buf.len() + bytes.len() > self.limit {
            tracing::debug!(limit = self.limit, "Response too large to cache");
            self.overflowed = true;
            self.buf = Vec::new();
            return None;
        }
        self.buf.extend_from_slice(bytes);

        if self.head.is_none() {
            let end = self.scanner.advance(&self.buf)?;
            self.head = Some(end);
            self.content_length = Response::parse(&self.buf[..end.body_start]).content_length();
        }

        let end = self.head?;
        let expected = self.content_length?;
        if self.buf.len() - end.body_start >= expected {
            Some(Response::parse(&self.buf[..end.body_start + expected]))
        } else {
            None
        }
    }

    /// The origin closed; return whatever can still be cached.
    fn finish(self) -> Option<Response> {
        if self.overflowed || self.buf.is_empty() {
            return None;
        }
        if let (Some(end), Some(expected)) = (self.head, self.content_length) {
            if self.buf.len() - end.body_start < expected {
                tracing::debug!(
                    expected,
                    received = self.buf.len() - end.body_start,
                    "Origin closed mid-body; not caching"
                );
                return None;
            }
        }
        Some(Response::parse(&self.buf))
    }
}
