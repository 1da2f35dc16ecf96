//! Fuzz target for raw reservation parsing and bucketing.
//!
//! Run with: cargo +nightly fuzz run reservation_fuzz -- -max_total_time=60

#![no_main]

use chrono::{TimeZone, Utc};
use libfuzzer_sys::fuzz_target;
use roost_revenue::{process_raw_reservations, RevenueRecord, HORIZONS};
use serde_json::Value;

fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<Value>(data) else {
        return;
    };

    let reservations = match value {
        Value::Array(items) => items,
        other => vec![other],
    };

    for reservation in &reservations {
        if let Ok(record) = RevenueRecord::from_reservation(reservation) {
            assert!(record.amount.is_finite());
        }
    }

    let Some(now) = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).single() else {
        return;
    };
    let summary = process_raw_reservations(&reservations, now);
    for horizon in HORIZONS {
        assert_eq!(summary.get(horizon).data.len(), horizon.bucket_count());
    }
});
