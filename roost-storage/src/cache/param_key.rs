//! Canonical parameter keys.
//!
//! Two parameter objects holding the same key/value pairs must land on the
//! same cache entry no matter what order the caller built them in. Params are
//! serialized to JSON, nulls are dropped, keys are sorted, and the result is
//! written compactly.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// Suffix that marks the metadata sibling of a cache entry.
const META_SUFFIX: &str = "_meta";

/// Encode request parameters into a deterministic cache-key suffix.
///
/// Absent params, JSON `null`, and objects whose every value is `null`
/// encode to the empty string.
pub fn encode_params<P: Serialize + ?Sized>(params: &P) -> String {
    let value = match serde_json::to_value(params) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "Unserializable cache params, using base key");
            return String::new();
        }
    };

    match value {
        Value::Null => String::new(),
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> =
                map.into_iter().filter(|(_, v)| !v.is_null()).collect();
            if sorted.is_empty() {
                return String::new();
            }
            serde_json::to_string(&sorted).unwrap_or_default()
        }
        other => other.to_string(),
    }
}

/// Fully-resolved cache key: a logical base key plus canonical params.
///
/// Layout in the backing store (before the store's namespace prefix):
/// - entry: `base` or `base_<params>`
/// - meta:  `base_meta` or `base_meta_<params>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    base: String,
    params: String,
}

impl CacheKey {
    /// Build a key from a base name and caller params.
    pub fn new<P: Serialize + ?Sized>(base: impl Into<String>, params: &P) -> Self {
        Self {
            base: base.into(),
            params: encode_params(params),
        }
    }

    /// Build a key with no parameter suffix.
    pub fn plain(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            params: String::new(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Encoded params (empty when there are none).
    pub fn params(&self) -> &str {
        &self.params
    }

    /// Whether the base uses the `_meta` marker, which would let its entry
    /// collide with another key's metadata record.
    pub fn is_reserved(&self) -> bool {
        self.base.ends_with(META_SUFFIX) || self.base.contains(&format!("{META_SUFFIX}_"))
    }

    /// Key the `{data, timestamp}` record lives under.
    pub fn entry_key(&self) -> String {
        if self.params.is_empty() {
            self.base.clone()
        } else {
            format!("{}_{}", self.base, self.params)
        }
    }

    /// Key the `{timestamp, isEmpty}` sibling lives under.
    pub fn meta_key(&self) -> String {
        if self.params.is_empty() {
            format!("{}{}", self.base, META_SUFFIX)
        } else {
            format!("{}{}_{}", self.base, META_SUFFIX, self.params)
        }
    }
}
