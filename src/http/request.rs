//! Request parsing, serialization and routing metadata.
//!
//! # Responsibilities
//! - Parse a raw request into method, target, version, headers and body
//! - Serialize a request back to wire format for forwarding
//! - Extract the origin host and port from the `Host` header
//!
//! # Design Decisions
//! - Parsing never fails; missing request-line tokens are left empty
//! - The request is forwarded exactly as parsed (no header rewriting)

use crate::http::message::{split_message, HeaderMap, CRLF};
use crate::http::target::split_authority;

/// Host used when the request carries no `Host` header.
pub const DEFAULT_HOST: &str = "localhost";

/// Port used when the `Host` header has no usable port.
pub const DEFAULT_PORT: u16 = 80;

/// A parsed HTTP request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    /// Origin-form path or absolute-form URL, as sent by the client.
    pub target: String,
    pub version: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Request {
    /// Parse a raw request.
    pub fn parse(raw: &[u8]) -> Self {
        let msg = split_message(raw);
        let mut tokens = msg.start_line.split_whitespace();

        Self {
            method: tokens.next().unwrap_or_default().to_string(),
            target: tokens.next().unwrap_or_default().to_string(),
            version: tokens.next().unwrap_or_default().to_string(),
            headers: msg.headers,
            body: msg.body.to_vec(),
        }
    }

    /// Serialize to wire format.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(128 + self.body.len());
        out.extend_from_slice(
            format!("{} {} {}{}", self.method, self.target, self.version, CRLF).as_bytes(),
        );
        self.headers.write_to(&mut out);
        out.extend_from_slice(CRLF.as_bytes());
        out.extend_from_slice(&self.body);
        out
    }

    pub fn is_connect(&self) -> bool {
        self.method == "CONNECT"
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }
}

/// Origin host from the `Host` header, without any port.
pub fn extract_host(request: &Request) -> String {
    match request.headers.get("Host") {
        Some(value) => split_authority(value).0.to_string(),
        None => DEFAULT_HOST.to_string(),
    }
}

/// Origin port from the `Host` header.
pub fn extract_port(request: &Request) -> u16 {
    request
        .headers
        .get("Host")
        .and_then(|value| split_authority(value).1)
        .and_then(|port| port.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT)
}
