//! Timestamped cache store.
//!
//! Every `put` writes two records: the `{data, timestamp}` entry and its
//! `{timestamp, isEmpty}` metadata sibling, both stamped with the same
//! instant. Writes replace both records wholesale.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use roost_core::{Clock, RoostResult, StorageError, ValidationError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::param_key::CacheKey;
use super::traits::{CacheStats, KeyValueStore};

/// A cached payload and the instant it was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub data: T,
    pub timestamp: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    /// Age of the entry relative to `now`. Entries stamped in the future are
    /// zero seconds old.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.timestamp).to_std().unwrap_or(Duration::ZERO)
    }

    /// Whether the entry is older than `max_age` at `now`.
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        self.age(now) > max_age
    }
}

/// Sibling record describing the most recent write of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMetadata {
    pub timestamp: DateTime<Utc>,
    pub is_empty: bool,
}

#[derive(Debug, Default)]
struct StatCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    corrupt: AtomicU64,
    writes: AtomicU64,
    evictions: AtomicU64,
}

/// The single access point to the persistent key/value store.
///
/// Cheap to clone; clones share the backend, clock and counters.
#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    prefix: String,
    stats: Arc<StatCounters>,
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl CacheStore {
    /// Create a cache over `backend`, namespacing every key with `prefix`.
    pub fn new(
        backend: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            clock,
            prefix: prefix.into(),
            stats: Arc::new(StatCounters::default()),
        }
    }

    /// The namespace prepended to every key.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The clock used to stamp writes.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Write `data` under `key`, stamped with the current instant.
    ///
    /// The entry is written before its metadata, so metadata never describes
    /// a write that has not landed.
    pub async fn put<T: Serialize>(&self, key: &CacheKey, data: &T) -> RoostResult<()> {
        self.put_at(key, data, self.clock.now()).await
    }

    /// Write `data` under `key` stamped with `now`.
    ///
    /// Used by callers that already published the data under that instant.
    pub async fn put_at<T: Serialize>(
        &self,
        key: &CacheKey,
        data: &T,
        now: DateTime<Utc>,
    ) -> RoostResult<()> {
        check_key(key)?;
        let entry_key = self.namespaced(&key.entry_key());
        let meta_key = self.namespaced(&key.meta_key());

        let data_value = serde_json::to_value(data).map_err(|e| {
            StorageError::SerializationFailed {
                key: entry_key.clone(),
                reason: e.to_string(),
            }
        })?;
        let meta = CacheMetadata {
            timestamp: now,
            is_empty: is_empty_value(&data_value),
        };
        let entry = CacheEntry {
            data: data_value,
            timestamp: now,
        };

        let entry_json = serde_json::to_string(&entry).map_err(|e| {
            StorageError::SerializationFailed {
                key: entry_key.clone(),
                reason: e.to_string(),
            }
        })?;
        let meta_json = serde_json::to_string(&meta).map_err(|e| {
            StorageError::SerializationFailed {
                key: meta_key.clone(),
                reason: e.to_string(),
            }
        })?;

        self.backend.set(&entry_key, &entry_json).await?;
        self.backend.set(&meta_key, &meta_json).await?;
        self.stats.writes.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(key = %entry_key, is_empty = meta.is_empty, "Cache entry written");
        Ok(())
    }

    /// Read the entry under `key`.
    ///
    /// Absent, undecodable and unreadable entries all return `None`.
    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<CacheEntry<T>> {
        if let Err(e) = check_key(key) {
            self.stats.misses.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(error = %e, "Rejected cache read");
            return None;
        }
        let entry_key = self.namespaced(&key.entry_key());
        match self.read_json::<CacheEntry<T>>(&entry_key).await {
            Some(entry) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry)
            }
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Read the metadata sibling of `key`, with the same fail-open rule.
    pub async fn get_meta(&self, key: &CacheKey) -> Option<CacheMetadata> {
        if key.is_reserved() {
            return None;
        }
        let meta_key = self.namespaced(&key.meta_key());
        self.read_json::<CacheMetadata>(&meta_key).await
    }

    /// Read the entry under `key` only if it is at most `max_age` old.
    pub async fn get_fresh<T: DeserializeOwned>(
        &self,
        key: &CacheKey,
        max_age: Duration,
    ) -> Option<CacheEntry<T>> {
        let entry = self.get::<T>(key).await?;
        if entry.is_stale(self.clock.now(), max_age) {
            None
        } else {
            Some(entry)
        }
    }

    /// Remove the entry under `key` and its metadata sibling.
    pub async fn remove(&self, key: &CacheKey) -> RoostResult<()> {
        check_key(key)?;
        self.backend
            .remove(&self.namespaced(&key.entry_key()))
            .await?;
        self.backend
            .remove(&self.namespaced(&key.meta_key()))
            .await?;
        self.stats.evictions.fetch_add(2, Ordering::Relaxed);
        Ok(())
    }

    /// Remove every cache key starting with `prefix` (within the namespace).
    ///
    /// Returns the number of keys removed. Keys outside the namespace are
    /// never touched.
    pub async fn remove_by_prefix(&self, prefix: &str) -> RoostResult<u64> {
        let full_prefix = self.namespaced(prefix);
        let keys = self.backend.list_keys().await?;

        let mut removed = 0u64;
        for key in keys.iter().filter(|k| k.starts_with(&full_prefix)) {
            self.backend.remove(key).await?;
            removed += 1;
        }

        self.stats.evictions.fetch_add(removed, Ordering::Relaxed);
        tracing::debug!(prefix = %full_prefix, removed, "Cache keys evicted by prefix");
        Ok(removed)
    }

    /// Remove every key the cache owns.
    pub async fn clear(&self) -> RoostResult<u64> {
        self.remove_by_prefix("").await
    }

    /// Snapshot of the usage counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            corrupt: self.stats.corrupt.load(Ordering::Relaxed),
            writes: self.stats.writes.load(Ordering::Relaxed),
            evictions: self.stats.evictions.load(Ordering::Relaxed),
        }
    }

    async fn read_json<V: DeserializeOwned>(&self, full_key: &str) -> Option<V> {
        let raw = match self.backend.get(full_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key = %full_key, error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_str::<V>(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                self.stats.corrupt.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(key = %full_key, error = %e, "Corrupt cache entry, treating as miss");
                None
            }
        }
    }
}

/// Base keys may not use the metadata marker.
fn check_key(key: &CacheKey) -> Result<(), ValidationError> {
    if key.is_reserved() {
        return Err(ValidationError::InvalidFieldValue {
            field: "cache_key".to_string(),
            value: key.base().to_string(),
            reason: "base key must not use the `_meta` marker".to_string(),
        });
    }
    Ok(())
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
