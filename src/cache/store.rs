//! Shared response cache.
//!
//! # Responsibilities
//! - Map cache keys to responses with a freshness lifetime
//! - Enforce admission: GET only, 2xx only, positive TTL
//! - Evict stale entries lazily when they are looked up
//!
//! # Design Decisions
//! - Sharded map: each key's operations hold that key's shard lock, so a
//!   lookup that finds a stale entry removes it atomically
//! - No background sweep; a stale entry lives until its next lookup
//! - The enabled flag gates both paths independently of entry freshness

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::cache::key::CacheKey;
use crate::cache::policy::TtlPolicy;
use crate::config::CacheConfig;
use crate::http::{Request, Response};
use crate::observability::metrics;

/// A cached response and its lifetime.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub response: Response,
    pub inserted_at: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    /// An entry is fresh while its age is below its TTL.
    pub fn is_fresh_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) < self.ttl
    }
}

/// Process-wide response cache shared by all connections.
#[derive(Debug)]
pub struct CacheStore {
    entries: DashMap<CacheKey, CacheEntry>,
    enabled: AtomicBool,
    policy: TtlPolicy,
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new(TtlPolicy::default())
    }
}

impl CacheStore {
    /// Create an empty, enabled cache.
    pub fn new(policy: TtlPolicy) -> Self {
        Self {
            entries: DashMap::new(),
            enabled: AtomicBool::new(true),
            policy,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        let store = Self::new(TtlPolicy {
            default_ttl_secs: config.default_ttl_secs,
            expires_ttl_secs: config.expires_ttl_secs,
        });
        store.enabled.store(config.enabled, Ordering::SeqCst);
        store
    }

    /// Return the cached response for this request, if fresh.
    pub fn lookup(&self, request: &Request) -> Option<Response> {
        self.lookup_at(request, Instant::now())
    }

    pub(crate) fn lookup_at(&self, request: &Request, now: Instant) -> Option<Response> {
        if !self.is_enabled() || !request.is_get() {
            return None;
        }

        let key = CacheKey::from_request(request);
        let hit = match self.entries.entry(key.clone()) {
            Entry::Occupied(entry) if entry.get().is_fresh_at(now) => {
                Some(entry.get().response.clone())
            }
            Entry::Occupied(entry) => {
                entry.remove();
                tracing::info!(cache_key = %key, "Cache entry expired");
                metrics::record_cache_size(self.entries.len());
                None
            }
            Entry::Vacant(_) => None,
        };

        metrics::record_cache_lookup(hit.is_some());
        if hit.is_some() {
            tracing::info!(cache_key = %key, "Cache hit");
        } else {
            tracing::info!(cache_key = %key, "Cache miss");
        }
        hit
    }

    /// Admit a response for this request. Returns whether it was stored.
    pub fn store(&self, request: &Request, response: &Response) -> bool {
        self.store_at(request, response, Instant::now())
    }

    pub(crate) fn store_at(&self, request: &Request, response: &Response, now: Instant) -> bool {
        if !self.is_enabled() || !request.is_get() || !response.is_success() {
            return false;
        }

        let ttl_secs = self.policy.ttl_secs(&response.headers);
        let key = CacheKey::from_request(request);
        if ttl_secs <= 0 {
            tracing::debug!(cache_key = %key, "Response not cacheable");
            return false;
        }

        tracing::info!(
            cache_key = %key,
            ttl_secs,
            body_bytes = response.body.len(),
            "Response cached"
        );
        self.entries.insert(
            key,
            CacheEntry {
                response: response.clone(),
                inserted_at: now,
                ttl: Duration::from_secs(ttl_secs as u64),
            },
        );
        metrics::record_cache_store();
        metrics::record_cache_size(self.entries.len());
        true
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.clear();
        metrics::record_cache_size(0);
        tracing::info!("Cache cleared");
    }

    /// Number of entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        tracing::info!(enabled, "Caching toggled");
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn get(path: &str) -> Request {
        Request::parse(format!("GET {} HTTP/1.1\r\nHost: svc.test\r\n\r\n", path).as_bytes())
    }

    fn ok(body: &str, cache_control: Option<&str>) -> Response {
        let mut resp = Response {
            version: "HTTP/1.1".into(),
            status_code: 200,
            reason: "OK".into(),
            body: body.as_bytes().to_vec(),
            ..Default::default()
        };
        if let Some(cc) = cache_control {
            resp.headers.insert("Cache-Control", cc);
        }
        resp
    }

    #[test]
    fn hit_before_ttl_and_eviction_after() {
        let cache = CacheStore::default();
        let req = get("/x");
        let resp = ok("ok", Some("max-age=60"));
        let t0 = Instant::now();

        assert!(cache.store_at(&req, &resp, t0));
        assert_eq!(cache.lookup_at(&req, t0 + Duration::from_secs(1)), Some(resp.clone()));
        assert_eq!(cache.lookup_at(&req, t0 + Duration::from_secs(59)), Some(resp));

        assert_eq!(cache.lookup_at(&req, t0 + Duration::from_secs(60)), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn stale_entry_stays_until_looked_up() {
        let cache = CacheStore::default();
        let t0 = Instant::now();
        cache.store_at(&get("/a"), &ok("a", Some("max-age=1")), t0);
        cache.store_at(&get("/b"), &ok("b", Some("max-age=1")), t0);

        let later = t0 + Duration::from_secs(5);
        assert_eq!(cache.lookup_at(&get("/a"), later), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn only_get_requests_are_admitted() {
        let cache = CacheStore::default();
        for method in ["PUT", "POST", "DELETE", "HEAD", "CONNECT"] {
            let req = Request::parse(
                format!("{} /x HTTP/1.1\r\nHost: svc.test\r\n\r\n", method).as_bytes(),
            );
            assert!(!cache.store(&req, &ok("x", None)));
            assert!(cache.lookup(&req).is_none());
        }
        assert!(cache.is_empty());
    }

    #[test]
    fn only_success_responses_are_admitted() {
        let cache = CacheStore::default();
        for code in [100, 199, 301, 304, 404, 500] {
            let mut resp = ok("x", None);
            resp.status_code = code;
            assert!(!cache.store(&get("/x"), &resp), "status {} was admitted", code);
        }
        let mut resp = ok("x", None);
        resp.status_code = 299;
        assert!(cache.store(&get("/x"), &resp));
    }

    #[test]
    fn no_store_is_never_retrievable() {
        let cache = CacheStore::default();
        let req = get("/secret");
        assert!(!cache.store(&req, &ok("s", Some("no-store"))));
        assert!(cache.lookup(&req).is_none());
    }

    #[test]
    fn max_age_sets_exact_ttl() {
        let cache = CacheStore::default();
        let req = get("/x");
        let t0 = Instant::now();
        cache.store_at(&req, &ok("x", Some("max-age=5, must-revalidate")), t0);

        assert!(cache.lookup_at(&req, t0 + Duration::from_millis(4_999)).is_some());
        assert!(cache.lookup_at(&req, t0 + Duration::from_secs(5)).is_none());
    }

    #[test]
    fn later_store_replaces_entry() {
        let cache = CacheStore::default();
        let req = get("/x");
        cache.store(&req, &ok("first", None));
        cache.store(&req, &ok("second", None));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.lookup(&req).unwrap().body, b"second");
    }

    #[test]
    fn absolute_form_hits_origin_form_entry() {
        let cache = CacheStore::default();
        cache.store(&get("/a/b"), &ok("shared", None));
        let absolute = Request::parse(b"GET http://svc.test/a/b HTTP/1.1\r\nHost: svc.test\r\n\r\n");
        assert_eq!(cache.lookup(&absolute).unwrap().body, b"shared");
    }

    #[test]
    fn disabled_cache_bypasses_both_paths() {
        let cache = CacheStore::default();
        let req = get("/x");
        cache.store(&req, &ok("x", None));

        cache.set_enabled(false);
        assert!(!cache.is_enabled());
        assert!(cache.lookup(&req).is_none());
        assert!(!cache.store(&get("/y"), &ok("y", None)));
        assert_eq!(cache.len(), 1);

        cache.set_enabled(true);
        assert!(cache.lookup(&req).is_some());

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn concurrent_stores_and_lookups_do_not_mix() {
        let cache = Arc::new(CacheStore::default());
        let n = 64;

        std::thread::scope(|s| {
            for i in 0..n {
                let cache = &cache;
                s.spawn(move || {
                    let body = format!("body-{}", i);
                    assert!(cache.store(&get(&format!("/item/{}", i)), &ok(&body, None)));
                });
            }
        });
        assert_eq!(cache.len(), n);

        std::thread::scope(|s| {
            for i in 0..n {
                let cache = &cache;
                s.spawn(move || {
                    let resp = cache.lookup(&get(&format!("/item/{}", i))).unwrap();
                    assert_eq!(resp.body, format!("body-{}", i).into_bytes());
                });
            }
        });
    }
}
