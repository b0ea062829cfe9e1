//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (accept loop, one task per connection)
//!     → handler.rs (read head, classify)
//!     → request.rs / response.rs (lenient parse & serialize)
//!     → cache lookup | origin forward | CONNECT tunnel
//!     → Send to client, close
//! ```

pub mod handler;
pub mod message;
pub mod request;
pub mod response;
pub mod server;
pub mod target;

pub use handler::{Classification, ConnectionHandler, HandlerSettings};
pub use message::HeaderMap;
pub use request::{extract_host, extract_port, Request};
pub use response::Response;
pub use server::ProxyServer;
