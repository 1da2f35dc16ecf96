//! Published controller state and options.

use std::time::Duration;

use chrono::{DateTime, Utc};
use roost_core::{FetchError, RoostConfig};

/// Snapshot of one cached resource as seen by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceState<T> {
    /// Last published data; survives failed fetches.
    pub data: Option<T>,
    /// True only while a foreground fetch that asked for a loading indicator runs.
    pub is_loading: bool,
    /// True once `data` came from a completed fetch rather than the cache.
    pub is_fresh_data: bool,
    /// Error of the last foreground fetch, cleared by the next success.
    pub error: Option<FetchError>,
    /// When `data` was written (cache timestamp or fetch completion).
    pub updated_at: Option<DateTime<Utc>>,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            data: None,
            is_loading: false,
            is_fresh_data: false,
            error: None,
            updated_at: None,
        }
    }
}

impl<T> ResourceState<T> {
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }
}

/// Per-resource behavior knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceOptions {
    /// Activate on `mount` and on params/dependency changes.
    pub auto_fetch: bool,
    /// Cached data older than this triggers a background refresh.
    pub max_age: Duration,
    /// Fetch attempts within this window of the previous start are suppressed.
    pub throttle_window: Duration,
}

impl Default for ResourceOptions {
    fn default() -> Self {
        Self::from_config(&RoostConfig::default())
    }
}

impl ResourceOptions {
    /// Options carrying the config's max age and throttle window.
    pub fn from_config(config: &RoostConfig) -> Self {
        Self {
            auto_fetch: true,
            max_age: config.max_age,
            throttle_window: config.throttle_window,
        }
    }

    pub fn with_auto_fetch(mut self, auto_fetch: bool) -> Self {
        self.auto_fetch = auto_fetch;
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn with_throttle_window(mut self, window: Duration) -> Self {
        self.throttle_window = window;
        self
    }
}
