//! Request-target and authority parsing.
//!
//! Forward proxies see two target forms on the wire:
//! - origin-form: `/path?query`
//! - absolute-form: `http://host[:port]/path?query`
//!
//! plus the authority-form `host:port` used by CONNECT.

/// Strip scheme and authority from an absolute-form target.
///
/// Origin-form targets are returned unchanged. An absolute-form target with
/// no path after the authority normalizes to `/`.
pub fn normalize_path(target: &str) -> &str {
    let Some(scheme_end) = target.find("://") else {
        return target;
    };
    let after_scheme = &target[scheme_end + 3..];
    match after_scheme.find('/') {
        Some(slash) => &after_scheme[slash..],
        None => "/",
    }
}

/// Split `host[:port]` into its parts.
///
/// Bracketed IPv6 literals (`[::1]:8080`) are unwrapped. The port is `None`
/// when absent; the raw port text is returned so callers decide how strict
/// to be about malformed values.
pub fn split_authority(authority: &str) -> (&str, Option<&str>) {
    if let Some(rest) = authority.strip_prefix('[') {
        if let Some(close) = rest.find(']') {
            let host = &rest[..close];
            let port = rest[close + 1..].strip_prefix(':');
            return (host, port);
        }
    }
    match authority.rsplit_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (authority, None),
    }
}

/// A parsed CONNECT target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectTarget {
    pub host: String,
    pub port: u16,
}

impl ConnectTarget {
    /// Parse an authority-form CONNECT target.
    ///
    /// A missing colon or a non-numeric port yields `None`.
    pub fn parse(target: &str) -> Option<Self> {
        let (host, port) = split_authority(target.trim());
        let port = port?.parse::<u16>().ok()?;
        if host.is_empty() {
            return None;
        }
        Some(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl std::fmt::Display for ConnectTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}
