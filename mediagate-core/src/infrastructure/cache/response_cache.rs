//! TTL response cache
//!
//! Entries expire lazily: a lookup that finds a stale entry removes it and
//! reports a miss. Stale entries nobody reads again are dropped by
//! [`ResponseCache::purge_expired`], which the server runs periodically.
//! There is no size bound.

use bytes::Bytes;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::domain::CacheEntry;
use crate::infrastructure::clock::Clock;

/// Shared in-memory cache of upstream payloads
pub struct ResponseCache {
    entries: DashMap<String, CacheEntry>,
    clock: Arc<dyn Clock>,
}

impl ResponseCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Fresh entry for `key`, if any
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        let now = self.clock.now();

        // Clone out and release the shard guard before any removal
        let entry = self.entries.get(key).map(|e| e.value().clone())?;

        if entry.is_expired_at(now) {
            // A concurrent put may have replaced the entry; only drop it if still stale
            self.entries.remove_if(key, |_, e| e.is_expired_at(now));
            debug!(key = %key, "Cache entry expired");
            return None;
        }

        Some(entry)
    }

    /// Store `payload` under `key` for `ttl`, replacing any previous entry
    pub fn put(&self, key: &str, payload: Bytes, content_type: &str, ttl: Duration) {
        self.insert(key, payload, content_type, ttl, false);
    }

    /// Store a substitute payload; hits on it keep reporting the substitution
    pub fn put_fallback(&self, key: &str, payload: Bytes, content_type: &str, ttl: Duration) {
        self.insert(key, payload, content_type, ttl, true);
    }

    fn insert(&self, key: &str, payload: Bytes, content_type: &str, ttl: Duration, fallback: bool) {
        let expires_at = self.clock.now() + ttl;
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                key: key.to_string(),
                payload,
                content_type: content_type.to_string(),
                expires_at,
                fallback,
            },
        );
        debug!(key = %key, ttl_secs = ttl.as_secs(), fallback, "Cached response");
    }

    /// Number of stored entries, stale ones included until next touched
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every stale entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        before.saturating_sub(self.entries.len())
    }
}
