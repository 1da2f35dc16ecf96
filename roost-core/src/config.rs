//! Configuration types
//!
//! Configuration is an explicit value handed to the cache layer and the
//! dashboard; nothing reads process-wide state after construction.

use crate::error::{ConfigError, RoostError, RoostResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default age after which a cached entry triggers a background refresh.
pub const DEFAULT_MAX_AGE_SECS: u64 = 24 * 60 * 60;

/// Default minimum spacing between two fetch starts of one controller.
pub const DEFAULT_THROTTLE_MS: u64 = 5_000;

/// Default namespace for every key the cache writes.
pub const DEFAULT_KEY_PREFIX: &str = "@roost_cache:";

/// Default number of trailing months requested from the monthly source.
pub const DEFAULT_MONTHLY_WINDOW_MONTHS: u32 = 24;

/// Default LMDB map size in megabytes.
pub const DEFAULT_LMDB_MAP_SIZE_MB: usize = 64;

/// Master configuration for the data layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoostConfig {
    /// Cached data older than this is refreshed in the background.
    pub max_age: Duration,
    /// Fetch attempts closer than this to the previous start are suppressed.
    pub throttle_window: Duration,
    /// Namespace prepended to every cache key.
    pub key_prefix: String,
    /// Trailing months requested for chart views (at most 24).
    pub monthly_window_months: u32,
    /// Upper bound of the LMDB memory map.
    pub lmdb_map_size_mb: usize,
}

impl Default for RoostConfig {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(DEFAULT_MAX_AGE_SECS),
            throttle_window: Duration::from_millis(DEFAULT_THROTTLE_MS),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            monthly_window_months: DEFAULT_MONTHLY_WINDOW_MONTHS,
            lmdb_map_size_mb: DEFAULT_LMDB_MAP_SIZE_MB,
        }
    }
}

impl RoostConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create RoostConfig from environment variables.
    ///
    /// Environment variables:
    /// - `ROOST_CACHE_MAX_AGE_SECS`: background refresh threshold (default: 86400)
    /// - `ROOST_FETCH_THROTTLE_MS`: minimum spacing between fetches (default: 5000)
    /// - `ROOST_CACHE_KEY_PREFIX`: cache key namespace (default: "@roost_cache:")
    /// - `ROOST_MONTHLY_WINDOW_MONTHS`: months requested for charts (default: 24)
    /// - `ROOST_LMDB_MAP_SIZE_MB`: LMDB map size (default: 64)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let max_age = Duration::from_secs(
            std::env::var("ROOST_CACHE_MAX_AGE_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_AGE_SECS),
        );

        let throttle_window = Duration::from_millis(
            std::env::var("ROOST_FETCH_THROTTLE_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_THROTTLE_MS),
        );

        let key_prefix = std::env::var("ROOST_CACHE_KEY_PREFIX")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_KEY_PREFIX.to_string());

        let monthly_window_months = std::env::var("ROOST_MONTHLY_WINDOW_MONTHS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MONTHLY_WINDOW_MONTHS);

        let lmdb_map_size_mb = std::env::var("ROOST_LMDB_MAP_SIZE_MB")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_LMDB_MAP_SIZE_MB);

        Self {
            max_age,
            throttle_window,
            key_prefix,
            monthly_window_months,
            lmdb_map_size_mb,
        }
    }

    /// Set the background refresh threshold.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Set the fetch throttle window.
    pub fn with_throttle_window(mut self, window: Duration) -> Self {
        self.throttle_window = window;
        self
    }

    /// Set the cache key namespace.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Set the number of trailing months requested for charts.
    pub fn with_monthly_window(mut self, months: u32) -> Self {
        self.monthly_window_months = months;
        self
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - `max_age` and `throttle_window` are positive
    /// - `key_prefix` is not blank
    /// - `monthly_window_months` is within 1..=24
    /// - `lmdb_map_size_mb` is positive
    pub fn validate(&self) -> RoostResult<()> {
        if self.max_age.is_zero() {
            return Err(invalid("max_age", format!("{:?}", self.max_age), "max_age must be positive"));
        }

        if self.throttle_window.is_zero() {
            return Err(invalid(
                "throttle_window",
                format!("{:?}", self.throttle_window),
                "throttle_window must be positive",
            ));
        }

        if self.key_prefix.trim().is_empty() {
            return Err(invalid(
                "key_prefix",
                self.key_prefix.clone(),
                "key_prefix must not be blank",
            ));
        }

        if !(1..=24).contains(&self.monthly_window_months) {
            return Err(invalid(
                "monthly_window_months",
                self.monthly_window_months.to_string(),
                "monthly_window_months must be between 1 and 24",
            ));
        }

        if self.lmdb_map_size_mb == 0 {
            return Err(invalid(
                "lmdb_map_size_mb",
                self.lmdb_map_size_mb.to_string(),
                "lmdb_map_size_mb must be positive",
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, value: String, reason: &str) -> RoostError {
    RoostError::Config(ConfigError::InvalidValue {
        field: field.to_string(),
        value,
        reason: reason.to_string(),
    })
}
