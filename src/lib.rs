//! Caching forward HTTP proxy library.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!                 │                    FORWARD PROXY                      │
//!   Client        │  ┌──────────┐    ┌───────────┐    ┌──────────────┐   │
//!   ──────────────┼─▶│   net    │───▶│   http    │───▶│    cache     │   │
//!                 │  │ listener │    │  handler  │    │    store     │   │
//!                 │  └──────────┘    └─────┬─────┘    └──────────────┘   │
//!                 │                        │ miss / non-GET               │
//!                 │                        ▼                              │
//!                 │                 ┌─────────────┐                       │     Origin
//!                 │                 │ net::origin │───────────────────────┼───▶ Server
//!                 │                 └─────────────┘                       │
//!                 │                        │ CONNECT                      │
//!                 │                        ▼                              │
//!                 │                 ┌─────────────┐                       │
//!                 │                 │ net::tunnel │◀══ opaque bytes ══════┼═══▶
//!                 │                 └─────────────┘                       │
//!                 │  config · observability · lifecycle · resilience      │
//!                 └──────────────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod resilience;

pub use cache::CacheStore;
pub use config::ProxyConfig;
pub use error::ProxyError;
pub use http::ProxyServer;
pub use lifecycle::Shutdown;
