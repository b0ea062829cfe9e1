//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Apply port argument → Start metrics → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drop (or drain) connections → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger shutdown
//! ```
//!
//! # Design Decisions
//! - Only a bad config file or a failed bind is fatal (exit code 1)
//! - Ordered shutdown: stop accept, then settle in-flight connections

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
