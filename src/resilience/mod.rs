//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Origin connect / socket read:
//!     → timeouts.rs (optional deadline)
//!     → on expiry: TimedOut error, the affected connection is closed
//! ```
//!
//! # Design Decisions
//! - Deadlines are opt-in; unset means reads block until data or close
//! - A timeout only ever affects the connection it fired on

pub mod timeouts;
