//! Cache key derivation.

use crate::http::target::normalize_path;
use crate::http::Request;

/// Host component used when the request has no `Host` header.
const UNKNOWN_HOST: &str = "unknown";

/// Fingerprint of a cacheable request: method, host and normalized path.
///
/// Absolute-form and origin-form targets for the same resource produce the
/// same key, so `GET http://h/p` and `GET /p` with `Host: h` share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    method: String,
    host: String,
    path: String,
}

impl CacheKey {
    pub fn from_request(request: &Request) -> Self {
        Self {
            method: request.method.clone(),
            host: request
                .headers
                .get("Host")
                .unwrap_or(UNKNOWN_HOST)
                .to_string(),
            path: normalize_path(&request.target).to_string(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.method, self.host, self.path)
    }
}
