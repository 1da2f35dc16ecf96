//! Key/value backend trait and cache statistics.
//!
//! The persistent store itself lives outside this crate (device storage,
//! LMDB, a test fake); the cache only sees it through [`KeyValueStore`].

use async_trait::async_trait;
use roost_core::StorageError;

/// Persistent string key/value store.
///
/// Implementations must be safe to share between controllers. Concurrent
/// writers to the same key may interleave; the last write wins.
///
/// # Key Format
///
/// Keys are opaque strings. The cache namespaces its own keys with a prefix
/// so [`KeyValueStore::list_keys`] may return keys owned by other code.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get the raw value stored under `key`, or None if absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// List every key currently stored.
    async fn list_keys(&self) -> Result<Vec<String>, StorageError>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads that returned an entry.
    pub hits: u64,
    /// Reads that found nothing.
    pub misses: u64,
    /// Reads whose stored value could not be decoded (also counted as misses).
    pub corrupt: u64,
    /// Successful writes.
    pub writes: u64,
    /// Keys removed through `remove` / `remove_by_prefix`.
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_hit_rate() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 0.8).abs() < 0.001);

        let empty_stats = CacheStats::default();
        assert!((empty_stats.hit_rate() - 0.0).abs() < 0.001);
    }
}
