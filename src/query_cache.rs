//! Per-tab query cache of server-derived data.
//!
//! Key properties:
//! - Lives in memory only, one instance per tab
//! - Wiped as a whole on every identity change (login, logout, expiry)
//! - Every reader and writer of profile data goes through `QueryKey::user_profile()`

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

// ═══════════════════════════════════════════════════════════
// QueryKey
// ═══════════════════════════════════════════════════════════

/// Name of a cached query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(String);

impl QueryKey {
    pub const USER_PROFILE: &'static str = "userProfile";
    pub const ASSIGNED_REQUESTS: &'static str = "assignedRequests";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The one key profile data is read from and written to.
    pub fn user_profile() -> Self {
        Self::new(Self::USER_PROFILE)
    }

    pub fn assigned_requests() -> Self {
        Self::new(Self::ASSIGNED_REQUESTS)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ═══════════════════════════════════════════════════════════
// QueryCache trait
// ═══════════════════════════════════════════════════════════

/// Minimal cache contract the session layer depends on.
/// All operations are synchronous and never fail.
pub trait QueryCache: Send + Sync {
    fn get(&self, key: &QueryKey) -> Option<Value>;
    /// Seed or overwrite an entry without a network round trip.
    fn set(&self, key: QueryKey, value: Value);
    fn remove(&self, key: &QueryKey);
    /// Evict every entry.
    fn clear(&self);
    fn keys(&self) -> Vec<QueryKey>;
    /// Time since the entry was written, if the cache tracks it.
    fn age(&self, _key: &QueryKey) -> Option<Duration> {
        None
    }
}

/// Typed access on top of any `QueryCache`.
pub trait QueryCacheExt: QueryCache {
    /// Read and decode an entry. An entry that no longer decodes is a miss.
    fn get_typed<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                tracing::warn!(key = %key, "Cached value failed to decode: {e}");
                None
            }
        }
    }

    fn set_typed<T: Serialize>(&self, key: QueryKey, value: &T) -> Result<(), serde_json::Error> {
        self.set(key, serde_json::to_value(value)?);
        Ok(())
    }

    /// Whether the entry is missing or was written longer than `max_age` ago.
    fn is_stale(&self, key: &QueryKey, max_age: Duration) -> bool {
        match self.age(key) {
            Some(age) => age > max_age,
            None => self.get(key).is_none(),
        }
    }
}

impl<C: QueryCache + ?Sized> QueryCacheExt for C {}

// ═══════════════════════════════════════════════════════════
// MemoryQueryCache
// ═══════════════════════════════════════════════════════════

struct CacheEntry {
    value: Value,
    written_at: Instant,
}

/// In-memory cache backed by a `RwLock<HashMap>`.
///
/// A poisoned lock is treated as an empty cache on reads and recovered on
/// writes, so a panic elsewhere can never resurrect stale entries.
#[derive(Default)]
pub struct MemoryQueryCache {
    entries: RwLock<HashMap<QueryKey, CacheEntry>>,
}

impl MemoryQueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<QueryKey, CacheEntry>> {
        self.entries.write().unwrap_or_else(|poisoned| {
            tracing::warn!("Query cache lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl QueryCache for MemoryQueryCache {
    fn get(&self, key: &QueryKey) -> Option<Value> {
        let entries = self.entries.read().ok()?;
        entries.get(key).map(|entry| entry.value.clone())
    }

    fn set(&self, key: QueryKey, value: Value) {
        self.write().insert(
            key,
            CacheEntry {
                value,
                written_at: Instant::now(),
            },
        );
    }

    fn remove(&self, key: &QueryKey) {
        self.write().remove(key);
    }

    fn clear(&self) {
        let mut entries = self.write();
        let evicted = entries.len();
        entries.clear();
        tracing::debug!(evicted, "Query cache cleared");
    }

    fn keys(&self) -> Vec<QueryKey> {
        self.entries
            .read()
            .map(|e| e.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn age(&self, key: &QueryKey) -> Option<Duration> {
        let entries = self.entries.read().ok()?;
        entries.get(key).map(|entry| entry.written_at.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_cache_is_empty() {
        let cache = MemoryQueryCache::new();
        assert!(cache.is_empty());
        assert!(cache.get(&QueryKey::user_profile()).is_none());
        assert!(cache.keys().is_empty());
    }

    #[test]
    fn set_then_get_returns_value() {
        let cache = MemoryQueryCache::new();
        cache.set(QueryKey::user_profile(), json!({"id": "u1"}));
        assert_eq!(cache.get(&QueryKey::user_profile()), Some(json!({"id": "u1"})));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn set_overwrites_existing_entry() {
        let cache = MemoryQueryCache::new();
        cache.set(QueryKey::user_profile(), json!({"id": "u1"}));
        cache.set(QueryKey::user_profile(), json!({"id": "u2"}));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&QueryKey::user_profile()), Some(json!({"id": "u2"})));
    }

    #[test]
    fn clear_removes_all_entries() {
        let cache = MemoryQueryCache::new();
        cache.set(QueryKey::user_profile(), json!({"id": "u1"}));
        cache.set(QueryKey::assigned_requests(), json!([]));
        cache.set(QueryKey::new("appointments"), json!([1, 2]));
        assert_eq!(cache.len(), 3);

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(&QueryKey::new("appointments")).is_none());
    }

    #[test]
    fn remove_only_touches_one_key() {
        let cache = MemoryQueryCache::new();
        cache.set(QueryKey::user_profile(), json!(1));
        cache.set(QueryKey::assigned_requests(), json!(2));

        cache.remove(&QueryKey::assigned_requests());
        assert_eq!(cache.keys(), vec![QueryKey::user_profile()]);
    }

    #[test]
    fn user_profile_key_is_stable() {
        assert_eq!(QueryKey::user_profile(), QueryKey::new("userProfile"));
        assert_eq!(QueryKey::user_profile().to_string(), QueryKey::USER_PROFILE);
    }

    #[test]
    fn typed_round_trip_and_decode_miss() {
        let cache = MemoryQueryCache::new();
        cache
            .set_typed(QueryKey::new("count"), &42u32)
            .unwrap();
        assert_eq!(cache.get_typed::<u32>(&QueryKey::new("count")), Some(42));
        // Wrong type decodes as a miss rather than an error
        assert_eq!(cache.get_typed::<Vec<String>>(&QueryKey::new("count")), None);
    }

    #[test]
    fn staleness_follows_age() {
        let cache = MemoryQueryCache::new();
        let key = QueryKey::assigned_requests();
        assert!(cache.is_stale(&key, Duration::from_secs(60)));

        cache.set(key.clone(), json!([]));
        assert!(!cache.is_stale(&key, Duration::from_secs(60)));
        assert!(cache.age(&key).is_some());

        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.is_stale(&key, Duration::ZERO));
    }
}
