//! Response cache subsystem.
//!
//! # Data Flow
//! ```text
//! GET request
//!     → key.rs (method, host, normalized path)
//!     → store.rs lookup (fresh → hit, stale → evict + miss)
//!
//! Origin response
//!     → policy.rs (Cache-Control / Expires → TTL)
//!     → store.rs admission (GET, 2xx, TTL > 0)
//! ```
//!
//! # Design Decisions
//! - In-memory and process-local; lost on restart
//! - Freshness checked lazily at read time
//! - The store is the only state shared across connections

pub mod key;
pub mod policy;
pub mod store;

pub use key::CacheKey;
pub use policy::TtlPolicy;
pub use store::{CacheEntry, CacheStore};
