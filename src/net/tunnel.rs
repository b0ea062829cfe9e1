//! CONNECT tunnel establishment and opaque byte relay.
//!
//! # Data Flow
//! ```text
//! Client ──── CONNECT host:port ───→ Proxy ──── TCP connect ───→ Origin
//! Client ←── 200 Connection Established ── (or 502 on connect failure)
//! Client ←──── raw bytes (both ways, never inspected) ────→ Origin
//! ```
//!
//! # Design Decisions
//! - One task per direction; each ends on its own EOF or error
//! - A finished direction half-closes its write side and nothing else
//! - Direction tasks live in a `JoinSet`, so they are aborted if the
//!   owning connection task is

use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinSet;

use crate::error::ProxyError;
use crate::http::target::ConnectTarget;
use crate::net::origin;
use crate::observability::metrics;
use crate::resilience::timeouts::with_timeout;

/// Sent to the client once the origin connection is open.
pub const CONNECTION_ESTABLISHED: &[u8] =
    b"HTTP/1.1 200 Connection Established\r\nConnection: close\r\n\r\n";

/// Sent to the client when the origin cannot be reached.
pub const BAD_GATEWAY: &[u8] = b"HTTP/1.1 502 Bad Gateway\r\nConnection: close\r\n\r\n";

/// Relay direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ClientToOrigin,
    OriginToClient,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::ClientToOrigin => "client_to_origin",
            Direction::OriginToClient => "origin_to_client",
        }
    }
}

/// Tuning for a tunnel.
#[derive(Debug, Clone, Copy)]
pub struct TunnelOptions {
    pub buffer_size: usize,
    pub connect_timeout: Option<Duration>,
    pub idle_timeout: Option<Duration>,
}

impl Default for TunnelOptions {
    fn default() -> Self {
        Self {
            buffer_size: 4096,
            connect_timeout: None,
            idle_timeout: None,
        }
    }
}

/// Bytes moved in each direction over the life of a tunnel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub client_to_origin: u64,
    pub origin_to_client: u64,
}

/// Establish a CONNECT tunnel for `target` and relay until both sides close.
///
/// `early_data` holds bytes the client sent after the CONNECT head; they are
/// delivered to the origin ahead of the relay.
pub async fn open_tunnel<C>(
    mut client: C,
    target: &str,
    early_data: &[u8],
    options: TunnelOptions,
) -> Result<RelayStats, ProxyError>
where
    C: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let Some(target) = ConnectTarget::parse(target) else {
        let _ = client.shutdown().await;
        return Err(ProxyError::InvalidConnectTarget(target.to_string()));
    };

    tracing::info!(target = %target, "Opening tunnel");

    let mut origin = match origin::connect(&target.host, target.port, options.connect_timeout).await {
        Ok(stream) => stream,
        Err(e) => {
            let _ = client.write_all(BAD_GATEWAY).await;
            let _ = client.shutdown().await;
            return Err(e);
        }
    };

    client.write_all(CONNECTION_ESTABLISHED).await?;
    if !early_data.is_empty() {
        origin.write_all(early_data).await?;
    }

    let stats = relay(client, origin, options.buffer_size, options.idle_timeout).await;
    tracing::info!(
        target = %target,
        client_to_origin = stats.client_to_origin,
        origin_to_client = stats.origin_to_client,
        "Tunnel closed"
    );
    Ok(stats)
}

/// Pump bytes between two streams in both directions.
///
/// Returns once both directions have ended; both streams are closed when
/// this returns.
pub async fn relay<A, B>(
    client: A,
    origin: B,
    buffer_size: usize,
    idle_timeout: Option<Duration>,
) -> RelayStats
where
    A: AsyncRead + AsyncWrite + Send + 'static,
    B: AsyncRead + AsyncWrite + Send + 'static,
{
    let (client_read, client_write) = tokio::io::split(client);
    let (origin_read, origin_write) = tokio::io::split(origin);

    let mut directions = JoinSet::new();
    directions.spawn(pump(
        client_read,
        origin_write,
        Direction::ClientToOrigin,
        buffer_size,
        idle_timeout,
    ));
    directions.spawn(pump(
        origin_read,
        client_write,
        Direction::OriginToClient,
        buffer_size,
        idle_timeout,
    ));

    let mut stats = RelayStats::default();
    while let Some(result) = directions.join_next().await {
        match result {
            Ok((Direction::ClientToOrigin, bytes)) => stats.client_to_origin = bytes,
            Ok((Direction::OriginToClient, bytes)) => stats.origin_to_client = bytes,
            Err(e) => tracing::warn!(error = %e, "Tunnel direction task failed"),
        }
    }
    stats
}

/// Copy `reader` into `writer` until EOF or error, then half-close `writer`.
async fn pump<R, W>(
    mut reader: R,
    mut writer: W,
    direction: Direction,
    buffer_size: usize,
    idle_timeout: Option<Duration>,
) -> (Direction, u64)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; buffer_size.max(1)];
    let mut total: u64 = 0;

    loop {
        let n = match with_timeout(idle_timeout, reader.read(&mut buf)).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                tracing::debug!(direction = direction.as_str(), error = %e, "Tunnel read ended");
                break;
            }
        };
        if let Err(e) = writer.write_all(&buf[..n]).await {
            tracing::debug!(direction = direction.as_str(), error = %e, "Tunnel write failed");
            break;
        }
        total += n as u64;
    }

    let _ = writer.shutdown().await;
    metrics::record_tunnel_bytes(direction.as_str(), total);
    (direction, total)
}
