//! Freshness lifetime derivation.
//!
//! # Priority (first match wins)
//! ```text
//! 1. Cache-Control max-age=<n>          → n   (non-numeric → default TTL)
//! 2. Cache-Control no-cache | no-store | private → 0 (never admitted)
//! 3. Expires present                     → expires TTL (value not parsed)
//! 4. otherwise                           → default TTL
//! ```
//!
//! A `max-age` directive anywhere in the header wins over `no-store` and
//! friends, regardless of their relative position.

use crate::http::message::HeaderMap;

/// Default lifetime for responses without caching headers.
pub const DEFAULT_TTL_SECS: i64 = 300;

/// Lifetime assigned to responses carrying `Expires`.
pub const EXPIRES_TTL_SECS: i64 = 3600;

const UNCACHEABLE_DIRECTIVES: [&str; 3] = ["no-cache", "no-store", "private"];

/// A single `Cache-Control` directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Directive<'a> {
    pub name: &'a str,
    pub value: Option<&'a str>,
}

/// Tokenize a `Cache-Control` value into comma-separated directives.
pub fn directives(value: &str) -> impl Iterator<Item = Directive<'_>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| match token.split_once('=') {
            Some((name, value)) => Directive {
                name: name.trim(),
                value: Some(value.trim()),
            },
            None => Directive {
                name: token,
                value: None,
            },
        })
}

/// Outcome of scanning a `Cache-Control` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheControl {
    /// A `max-age` directive; `None` when its value is not an integer.
    MaxAge(Option<i64>),
    /// One of `no-cache`, `no-store`, `private`.
    Uncacheable,
    /// No directive relevant to lifetime.
    Unspecified,
}

impl CacheControl {
    pub fn parse(value: &str) -> Self {
        if let Some(max_age) = directives(value).find(|d| d.name == "max-age") {
            return CacheControl::MaxAge(max_age.value.and_then(|v| v.parse().ok()));
        }
        if directives(value).any(|d| UNCACHEABLE_DIRECTIVES.contains(&d.name)) {
            return CacheControl::Uncacheable;
        }
        CacheControl::Unspecified
    }
}

/// TTL derivation with configurable fallbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    pub default_ttl_secs: i64,
    pub expires_ttl_secs: i64,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            default_ttl_secs: DEFAULT_TTL_SECS,
            expires_ttl_secs: EXPIRES_TTL_SECS,
        }
    }
}

impl TtlPolicy {
    /// Lifetime in seconds for a response with these headers.
    /// Zero or negative means the response must not be cached.
    pub fn ttl_secs(&self, headers: &HeaderMap) -> i64 {
        if let Some(value) = headers.get("Cache-Control") {
            match CacheControl::parse(value) {
                CacheControl::MaxAge(Some(secs)) => return secs,
                CacheControl::MaxAge(None) => return self.default_ttl_secs,
                CacheControl::Uncacheable => return 0,
                CacheControl::Unspecified => {}
            }
        }
        if headers.contains("Expires") {
            return self.expires_ttl_secs;
        }
        self.default_ttl_secs
    }
}
