//! Cache layer with explicit timestamps and fail-open reads.
//!
//! The [`CacheStore`] is the single access point to the persistent
//! [`KeyValueStore`]. Every write stores the payload together with the instant
//! it was written, plus a sibling metadata record, so readers can always tell
//! how old the data is.
//!
//! Reads never fail: a missing key, an undecodable value and a backend read
//! error all come back as `None`, which sends the caller to the network.
//!
//! # Example
//!
//! ```ignore
//! let store = CacheStore::new(Arc::new(MemoryStore::new()), Arc::new(SystemClock), "@roost_cache:");
//! let key = CacheKey::new("monthly_revenue", &params);
//!
//! store.put(&key, &series).await?;
//! if let Some(entry) = store.get::<MonthlySeries>(&key).await {
//!     println!("cached at {}", entry.timestamp);
//! }
//! ```

pub mod lmdb_backend;
pub mod memory;
pub mod param_key;
pub mod store;
pub mod traits;

pub use lmdb_backend::{LmdbStore, LmdbStoreError};
pub use memory::MemoryStore;
pub use param_key::{encode_params, CacheKey};
pub use store::{CacheEntry, CacheMetadata, CacheStore};
pub use traits::{CacheStats, KeyValueStore};
