//! Shared HTTP/1.x message framing.
//!
//! # Responsibilities
//! - Header mapping with deterministic serialization order
//! - Locate the blank-line delimiter between header block and body
//! - Split a raw message into start line, header lines and body
//!
//! # Design Decisions
//! - Framing is lenient: malformed input yields empty fields, never an error
//! - No Content-Length or chunked framing; the body is whatever follows the
//!   delimiter in the bytes read so far

use std::collections::BTreeMap;

/// Line terminator used when serializing.
pub const CRLF: &str = "\r\n";

/// Header mapping keyed by the name exactly as received.
///
/// Keys are case-sensitive for storage; a later duplicate replaces an
/// earlier one. Lookups fall back to a case-insensitive match so that
/// `host:` and `Host:` resolve the same.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: BTreeMap<String, String>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header, replacing any previous value for the exact name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(name.into(), value.into());
    }

    /// Get a header value by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        if let Some(value) = self.entries.get(name) {
            return Some(value.as_str());
        }
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate headers in serialization order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub(crate) fn write_to(&self, out: &mut Vec<u8>) {
        for (name, value) in self.iter() {
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(b": ");
            out.extend_from_slice(value.as_bytes());
            out.extend_from_slice(CRLF.as_bytes());
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = HeaderMap::new();
        for (k, v) in iter {
            headers.insert(k, v);
        }
        headers
    }
}

/// Position of the header delimiter within a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderEnd {
    /// Length of the start line plus header lines, excluding the blank line.
    pub head_len: usize,
    /// Offset of the first body byte.
    pub body_start: usize,
}

/// Find the first empty line (`\r\n` or bare `\n`) terminating a header block.
pub fn find_header_end(buf: &[u8]) -> Option<HeaderEnd> {
    HeaderScanner::new().advance(buf)
}

/// Incremental delimiter search over a growing buffer.
///
/// Each call resumes where the previous one stopped, so feeding a buffer
/// chunk by chunk visits every byte once.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderScanner {
    line_start: usize,
    scanned: usize,
}

impl HeaderScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan the bytes of `buf` not yet seen. `buf` must only ever grow
    /// between calls.
    pub fn advance(&mut self, buf: &[u8]) -> Option<HeaderEnd> {
        for (i, byte) in buf.iter().enumerate().skip(self.scanned) {
            if *byte != b'\n' {
                continue;
            }
            let line = &buf[self.line_start..i];
            // The start line is never the delimiter.
            if self.line_start > 0 && (line.is_empty() || line == b"\r") {
                self.scanned = i + 1;
                return Some(HeaderEnd {
                    head_len: self.line_start,
                    body_start: i + 1,
                });
            }
            self.line_start = i + 1;
        }
        self.scanned = buf.len();
        None
    }

    /// Bytes examined so far.
    pub fn scanned(&self) -> usize {
        self.scanned
    }
}

/// A raw message split into its three parts.
pub(crate) struct RawMessage<'a> {
    pub start_line: String,
    pub headers: HeaderMap,
    pub body: &'a [u8],
}

/// Split raw bytes into start line, headers and body.
///
/// Without a delimiter everything after the start line is treated as
/// header lines and the body is empty.
pub(crate) fn split_message(raw: &[u8]) -> RawMessage<'_> {
    let (head, body): (&[u8], &[u8]) = match find_header_end(raw) {
        Some(end) => (&raw[..end.head_len], &raw[end.body_start..]),
        None => (raw, &[]),
    };

    let head = String::from_utf8_lossy(head);
    let mut lines = head.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line));

    let start_line = lines.next().unwrap_or_default().to_string();
    let mut headers = HeaderMap::new();
    for line in lines {
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim(), value.trim());
        }
    }

    RawMessage {
        start_line,
        headers,
        body,
    }
}
