//! Response parsing and serialization.
//!
//! Mirrors request handling for the status line `VERSION CODE REASON`.
//! The reason phrase is the remainder of the status line and may contain
//! spaces; a non-numeric code parses as 0.

use crate::http::message::{split_message, HeaderMap, CRLF};

/// A parsed HTTP response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub version: String,
    pub status_code: u16,
    pub reason: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Response {
    /// Parse a raw response.
    pub fn parse(raw: &[u8]) -> Self {
        let msg = split_message(raw);
        let line = msg.start_line.trim();

        let (version, rest) = split_token(line);
        let (code, reason) = split_token(rest);

        Self {
            version: version.to_string(),
            status_code: code.parse().unwrap_or(0),
            reason: reason.to_string(),
            headers: msg.headers,
            body: msg.body.to_vec(),
        }
    }

    /// Serialize to wire format.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(128 + self.body.len());
        out.extend_from_slice(
            format!("{} {} {}{}", self.version, self.status_code, self.reason, CRLF).as_bytes(),
        );
        self.headers.write_to(&mut out);
        out.extend_from_slice(CRLF.as_bytes());
        out.extend_from_slice(&self.body);
        out
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Declared `Content-Length`, if present and numeric.
    pub fn content_length(&self) -> Option<usize> {
        self.headers
            .get("Content-Length")
            .and_then(|v| v.trim().parse().ok())
    }
}

/// Split off the first whitespace-delimited token.
fn split_token(s: &str) -> (&str, &str) {
    match s.split_once(char::is_whitespace) {
        Some((token, rest)) => (token, rest.trim_start()),
        None => (s, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_status_line_with_multi_word_reason() {
        let raw = b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n";
        let resp = Response::parse(raw);
        assert_eq!(resp.version, "HTTP/1.1");
        assert_eq!(resp.status_code, 404);
        assert_eq!(resp.reason, "Not Found");
        assert_eq!(resp.content_length(), Some(0));
        assert!(!resp.is_success());
    }

    #[test]
    fn non_numeric_code_parses_as_zero() {
        let resp = Response::parse(b"HTTP/1.1 abc Weird\r\n\r\n");
        assert_eq!(resp.status_code, 0);
        assert_eq!(resp.reason, "Weird");

        let empty = Response::parse(b"");
        assert_eq!(empty.status_code, 0);
        assert_eq!(empty.version, "");
    }

    #[test]
    fn serializes_and_reparses() {
        let mut resp = Response {
            version: "HTTP/1.1".into(),
            status_code: 200,
            reason: "OK".into(),
            body: b"ok".to_vec(),
            ..Default::default()
        };
        resp.headers.insert("Cache-Control", "max-age=60");

        let bytes = resp.to_bytes();
        assert_eq!(bytes, b"HTTP/1.1 200 OK\r\nCache-Control: max-age=60\r\n\r\nok");
        assert_eq!(Response::parse(&bytes), resp);
    }
}
