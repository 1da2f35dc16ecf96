//! Roost Storage - Cache Layer
//!
//! Persistent key/value caching with per-entry timestamps, deterministic
//! parameter keys, and the stale-while-revalidate controller that sits
//! between callers and their fetch functions.

pub mod cache;
pub mod swr;

// Re-export cache types for dashboard integration
pub use cache::{
    encode_params, CacheEntry, CacheKey, CacheMetadata, CacheStats, CacheStore, KeyValueStore,
    LmdbStore, LmdbStoreError, MemoryStore,
};
pub use swr::{
    fetcher_fn, CachedResource, DataFetcher, FnFetcher, ResourceOptions, ResourceState,
};
