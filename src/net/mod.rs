//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept, optional connection limit)
//!     → connection.rs (identity, state machine)
//!     → Hand off to HTTP layer
//!
//! Outgoing:
//!     origin.rs (connect to origin, optional timeout)
//!     tunnel.rs (CONNECT relay, two tasks per tunnel)
//!
//! Connection States:
//!     ReceivingRequest → Classified → {ServingFromCache | Forwarding | Tunneling} → Closed
//! ```
//!
//! # Design Decisions
//! - No bound on concurrent connections unless configured
//! - Tunnel bytes are never inspected

pub mod connection;
pub mod listener;
pub mod origin;
pub mod tunnel;
