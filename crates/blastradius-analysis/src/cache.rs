//! Process-local, bounded, time-to-live key-value cache (spec §4.1, §9).
//!
//! Grounded on `drift-analysis`'s `ParseCache` (`src/parsers/cache.rs`),
//! which wraps a single `moka::sync::Cache` keyed on a content hash. That
//! cache is monomorphic in its value type because it only ever stores one
//! kind of thing (`ParseResult`). This cache is deliberately the opposite:
//! spec §3 calls cache values "opaque", because every engine, the ignore
//! filter, and history search all share the *same* cache with *different*
//! value shapes. We keep moka's admission/eviction policy (bounded
//! capacity, time-to-live) and erase the value type through `serde_json`,
//! the same serialisation crate already in the dependency graph.

use std::sync::OnceLock;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace};

const CAPACITY: u64 = 100;
const TTL: Duration = Duration::from_secs(5 * 60);

/// Bounded, TTL'd, process-local cache. Cheap to clone (moka's `Cache` is
/// internally reference-counted), but callers should prefer `Cache::global`
/// — the spec's "only process-wide entity" is a single shared instance.
#[derive(Clone)]
pub struct Cache {
    inner: moka::sync::Cache<String, serde_json::Value>,
}

impl Cache {
    pub fn new() -> Self {
        Self {
            inner: moka::sync::Cache::builder()
                .max_capacity(CAPACITY)
                .time_to_live(TTL)
                .build(),
        }
    }

    /// The process-wide cache instance (spec §9: "the only process-wide
    /// entity is the cache").
    pub fn global() -> &'static Cache {
        static CACHE: OnceLock<Cache> = OnceLock::new();
        CACHE.get_or_init(Cache::new)
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.inner.get(key)?;
        match serde_json::from_value(value) {
            Ok(v) => {
                trace!(key, "cache hit");
                Some(v)
            }
            Err(_) => None,
        }
    }

    pub fn insert<T: Serialize>(&self, key: String, value: &T) {
        if let Ok(v) = serde_json::to_value(value) {
            debug!(key = %key, "cache insert");
            self.inner.insert(key, v);
        }
    }

    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

/// Compose a deterministic `:`-separated cache key (spec §4.1). Callers
/// append a configuration fingerprint (see
/// `blastradius_core::Configuration::fingerprint`) whenever the cached
/// result depends on configuration.
pub fn cache_key(parts: &[&str]) -> String {
    parts.join(":")
}
