//! Memoization port for main-trunk results.
//!
//! # Invariants
//! - Keys are `trunk:<property_id>`.
//! - Expired values are never returned.
//! - Results computed with non-empty overrides must never be stored; the
//!   trunk service enforces this before calling `set`.

use crate::model::document::Document;
use crate::model::property::PropertyId;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Cache port injected into the trunk service.
pub trait TrunkCache {
    fn get(&self, key: &str) -> Option<Vec<Document>>;
    fn set(&self, key: &str, value: Vec<Document>, ttl: Duration);
    fn invalidate(&self, key: &str);
}

impl<C: TrunkCache + ?Sized> TrunkCache for &C {
    fn get(&self, key: &str) -> Option<Vec<Document>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Vec<Document>, ttl: Duration) {
        (**self).set(key, value, ttl);
    }

    fn invalidate(&self, key: &str) {
        (**self).invalidate(key);
    }
}

/// Builds the cache key for one property's default trunk.
pub fn trunk_cache_key(property_id: PropertyId) -> String {
    format!("trunk:{property_id}")
}

/// Cache that stores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTrunkCache;

impl TrunkCache for NoopTrunkCache {
    fn get(&self, _key: &str) -> Option<Vec<Document>> {
        None
    }

    fn set(&self, _key: &str, _value: Vec<Document>, _ttl: Duration) {}

    fn invalidate(&self, _key: &str) {}
}

struct CachedTrunk {
    expires_at: Instant,
    documents: Vec<Document>,
}

/// Process-local cache with per-key expiry.
#[derive(Default)]
pub struct MemoryTrunkCache {
    entries: Mutex<HashMap<String, CachedTrunk>>,
}

impl MemoryTrunkCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys, expired ones included until next read.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TrunkCache for MemoryTrunkCache {
    fn get(&self, key: &str) -> Option<Vec<Document>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let expired = entries
            .get(key)
            .map(|cached| cached.expires_at <= Instant::now())?;
        if expired {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|cached| cached.documents.clone())
    }

    fn set(&self, key: &str, value: Vec<Document>, ttl: Duration) {
        let cached = CachedTrunk {
            expires_at: Instant::now() + ttl,
            documents: value,
        };
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), cached);
    }

    fn invalidate(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::{trunk_cache_key, MemoryTrunkCache, NoopTrunkCache, TrunkCache};
    use std::time::Duration;
    use uuid::Uuid;

    #[test]
    fn memory_cache_round_trips_until_invalidated() {
        let cache = MemoryTrunkCache::new();
        let key = trunk_cache_key(Uuid::new_v4());
        cache.set(&key, Vec::new(), Duration::from_secs(60));
        assert_eq!(cache.get(&key), Some(Vec::new()));

        cache.invalidate(&key);
        assert_eq!(cache.get(&key), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn memory_cache_drops_expired_values() {
        let cache = MemoryTrunkCache::new();
        cache.set("trunk:x", Vec::new(), Duration::ZERO);
        assert_eq!(cache.get("trunk:x"), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn noop_cache_never_returns_values() {
        let cache = NoopTrunkCache;
        cache.set("trunk:x", Vec::new(), Duration::from_secs(60));
        assert_eq!(cache.get("trunk:x"), None);
    }

    #[test]
    fn key_embeds_property_id() {
        let id = Uuid::new_v4();
        assert_eq!(trunk_cache_key(id), format!("trunk:{id}"));
    }
}
