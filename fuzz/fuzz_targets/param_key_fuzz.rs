//! Fuzz target for canonical param encoding.
//!
//! Run with: cargo +nightly fuzz run param_key_fuzz -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;
use roost_storage::{encode_params, CacheKey};
use serde_json::Value;

fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<Value>(data) else {
        return;
    };

    let encoded = encode_params(&value);
    // Encoding is a fixed point once keys are sorted and nulls dropped
    if let Ok(reparsed) = serde_json::from_str::<Value>(&encoded) {
        if reparsed.is_object() {
            assert_eq!(encode_params(&reparsed), encoded);
        }
    }

    let key = CacheKey::new("fuzz", &value);
    assert!(key.entry_key().starts_with("fuzz"));
    assert!(key.meta_key().starts_with("fuzz_meta"));
});
