//! Connection identity and state machine.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Name the states a client connection moves through
//!
//! # State Transitions
//! ```text
//! ReceivingRequest → Closed                       (nothing read)
//! ReceivingRequest → Classified → ServingFromCache → Closed
//!                              → Forwarding       → Closed
//!                              → Tunneling        → Closed
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Lifecycle state of a client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Reading the request head from the client.
    ReceivingRequest,
    /// Request parsed and routed to one of the paths below.
    Classified,
    /// Answering from the response cache.
    ServingFromCache,
    /// Relaying the request to the origin and streaming its response back.
    Forwarding,
    /// Relaying opaque bytes for a CONNECT tunnel.
    Tunneling,
    /// Both sides closed.
    Closed,
}

impl ConnectionState {
    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (ReceivingRequest, Classified)
                | (ReceivingRequest, Closed)
                | (Classified, ServingFromCache)
                | (Classified, Forwarding)
                | (Classified, Tunneling)
                | (ServingFromCache, Closed)
                | (Forwarding, Closed)
                | (Tunneling, Closed)
        )
    }
}
