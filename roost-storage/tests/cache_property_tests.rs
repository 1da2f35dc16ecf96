//! Property-Based Tests for the Cache Store and Parameter Keys
//!
//! **Property 1: Key Determinism**
//!
//! Two parameter objects with the same key/value pairs encode to the same
//! cache key regardless of insertion order, and null values never affect it.
//!
//! **Property 2: Write Visibility**
//!
//! For any payload, a `put` followed by a `get` on the same key returns the
//! payload stamped with the write instant, and the metadata sibling carries
//! the same instant.
//!
//! **Property 3: Namespace Isolation**
//!
//! Clearing the cache never removes keys outside its prefix.

use std::collections::BTreeMap;
use std::sync::Arc;

use proptest::prelude::*;
use roost_storage::{encode_params, CacheKey, CacheStore, KeyValueStore, MemoryStore};
use roost_test_utils::{arb_params_object, memory_cache, reference_now, test_clock};
use serde_json::{Map, Value};
use tokio::runtime::Runtime;

// ============================================================================
// TEST CONFIGURATION
// ============================================================================

fn test_runtime() -> Result<Runtime, TestCaseError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| TestCaseError::fail(format!("Failed to create runtime: {}", e)))
}

fn test_store() -> (CacheStore, Arc<MemoryStore>) {
    memory_cache(&test_clock(reference_now()))
}

// ============================================================================
// GENERATORS
// ============================================================================

/// Non-null param pairs in key order.
fn param_pairs() -> impl Strategy<Value = Vec<(String, Value)>> {
    arb_params_object().prop_map(|params| match params {
        Value::Object(map) => map.into_iter().filter(|(_, v)| !v.is_null()).collect(),
        _ => Vec::new(),
    })
}

fn object_from(pairs: &[(String, Value)]) -> Value {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert(k.clone(), v.clone());
    }
    Value::Object(map)
}

// ============================================================================
// PROPERTY TESTS
// ============================================================================

proptest! {
    #[test]
    fn param_order_does_not_change_key(pairs in param_pairs(), seed in any::<u64>()) {
        let forward = object_from(&pairs);

        let mut shuffled = pairs.clone();
        let len = shuffled.len().max(1);
        shuffled.rotate_left((seed as usize) % len);
        shuffled.reverse();
        let reordered = object_from(&shuffled);

        prop_assert_eq!(encode_params(&forward), encode_params(&reordered));
        prop_assert_eq!(
            CacheKey::new("revenue", &forward),
            CacheKey::new("revenue", &reordered)
        );
    }

    #[test]
    fn null_values_do_not_change_key(pairs in param_pairs(), extra in "[a-z]{11,14}") {
        let base = object_from(&pairs);
        let mut with_null = pairs.clone();
        with_null.push((extra, Value::Null));

        prop_assert_eq!(encode_params(&base), encode_params(&object_from(&with_null)));
    }

    #[test]
    fn nulls_in_raw_params_are_ignored(params in arb_params_object()) {
        let stripped = match &params {
            Value::Object(map) => Value::Object(
                map.iter()
                    .filter(|(_, v)| !v.is_null())
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
            other => other.clone(),
        };
        prop_assert_eq!(
            CacheKey::new("monthly_revenue", &params),
            CacheKey::new("monthly_revenue", &stripped)
        );
    }

    #[test]
    fn encoded_keys_are_sorted(pairs in param_pairs()) {
        let encoded = encode_params(&object_from(&pairs));
        if pairs.is_empty() {
            prop_assert_eq!(encoded, "");
        } else {
            let decoded: BTreeMap<String, Value> = serde_json::from_str(&encoded)
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            let keys: Vec<_> = decoded.keys().cloned().collect();
            let expected: Vec<_> = pairs.iter().map(|(k, _)| k.clone()).collect();
            prop_assert_eq!(keys, expected);
        }
    }

    #[test]
    fn put_then_get_returns_payload(pairs in param_pairs(), payload in param_pairs()) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let (store, _backend) = test_store();
            let key = CacheKey::new("listing_financials", &object_from(&pairs));
            let data = object_from(&payload);

            store.put(&key, &data).await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;

            let entry = store.get::<Value>(&key).await
                .ok_or_else(|| TestCaseError::fail("entry missing after put"))?;
            let meta = store.get_meta(&key).await
                .ok_or_else(|| TestCaseError::fail("meta missing after put"))?;

            prop_assert_eq!(&entry.data, &data);
            prop_assert_eq!(meta.timestamp, entry.timestamp);
            prop_assert_eq!(meta.is_empty, payload.is_empty());
            Ok::<(), TestCaseError>(())
        })?;
    }

    #[test]
    fn clear_never_touches_foreign_keys(
        foreign in prop::collection::btree_set("[a-z_]{1,12}", 0..5),
        owned in prop::collection::btree_set("[a-z]{1,8}", 1..5),
    ) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let (store, backend) = test_store();
            for key in &foreign {
                backend.set(key, "keep").await
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
            }
            for base in &owned {
                store.put(&CacheKey::plain(base.as_str()), &1u8).await
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
            }

            let removed = store.clear().await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(removed, (owned.len() * 2) as u64);
            prop_assert_eq!(backend.len(), foreign.len());
            Ok::<(), TestCaseError>(())
        })?;
    }
}
