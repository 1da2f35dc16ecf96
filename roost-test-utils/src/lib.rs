//! Roost Test Utilities
//!
//! Centralized test infrastructure for the Roost workspace:
//! - Fixtures (reference instants, manual clocks, in-memory caches)
//! - Mock fetchers for driving cache controllers
//! - Proptest generators for params, dates and raw reservations

// Re-export core types for convenience
pub use roost_core::{
    Clock, FetchError, ManualClock, RoostConfig, RoostError, RoostResult, StorageError,
    SystemClock, ValidationError, MONTH_LABELS,
};
pub use roost_storage::{
    CacheKey, CacheStore, CachedResource, DataFetcher, MemoryStore, ResourceOptions,
    ResourceState,
};

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

// ============================================================================
// FIXTURES
// ============================================================================

/// The instant most tests treat as "now": 2024-06-15 12:00:00 UTC.
pub fn reference_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

/// A manual clock starting at `at`.
pub fn test_clock(at: DateTime<Utc>) -> ManualClock {
    ManualClock::new(at)
}

/// Cache store over a fresh [`MemoryStore`] driven by `clock`.
pub fn memory_cache(clock: &ManualClock) -> (CacheStore, Arc<MemoryStore>) {
    let backend = Arc::new(MemoryStore::new());
    let store = CacheStore::new(
        backend.clone(),
        Arc::new(clock.clone()),
        roost_core::config::DEFAULT_KEY_PREFIX,
    );
    (store, backend)
}

/// Raw reservation object priced through `totalPrice`.
pub fn reservation_json(arrival_date: &str, total_price: f64, status: &str) -> Value {
    json!({
        "arrivalDate": arrival_date,
        "status": status,
        "totalPrice": total_price,
    })
}

/// Raw reservation object carrying both the channel payout and `totalPrice`.
pub fn payout_reservation_json(
    arrival_date: &str,
    payout: f64,
    total_price: f64,
    status: &str,
) -> Value {
    json!({
        "arrivalDate": arrival_date,
        "status": status,
        "airbnbExpectedPayoutAmount": payout,
        "totalPrice": total_price,
    })
}

// ============================================================================
// MOCK FETCHERS
// ============================================================================

/// Returns the same value on every call and counts calls.
#[derive(Debug, Clone)]
pub struct CountingFetcher<T> {
    value: T,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl<T> CountingFetcher<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Sleep (tokio time) before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Shared counter, still readable after the fetcher moved into a controller.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl<P, T> DataFetcher<P, T> for CountingFetcher<T>
where
    P: Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    async fn fetch(&self, _params: &P) -> Result<T, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.value.clone())
    }
}

/// Plays back a fixed script of responses, one per call.
///
/// Calls past the end of the script fail with a request error.
#[derive(Debug)]
pub struct ScriptedFetcher<T> {
    script: Mutex<VecDeque<(Duration, Result<T, FetchError>)>>,
    calls: AtomicUsize,
}

impl<T> ScriptedFetcher<T> {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Append an immediate response.
    pub fn then(self, response: Result<T, FetchError>) -> Self {
        self.then_after(Duration::ZERO, response)
    }

    /// Append a response delivered after `delay`.
    pub fn then_after(self, delay: Duration, response: Result<T, FetchError>) -> Self {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back((delay, response));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<T> Default for ScriptedFetcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<P, T> DataFetcher<P, T> for ScriptedFetcher<T>
where
    P: Send + Sync + 'static,
    T: Send + 'static,
{
    async fn fetch(&self, _params: &P) -> Result<T, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        match next {
            Some((delay, response)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                response
            }
            None => Err(FetchError::request("script exhausted")),
        }
    }
}

// ============================================================================
// GENERATORS
// ============================================================================

/// Statuses that count toward revenue.
pub fn arb_counted_status() -> impl Strategy<Value = String> {
    prop_oneof![Just("new"), Just("modified"), Just("ownerStay")].prop_map(String::from)
}

/// Any reservation status, counted or not.
pub fn arb_status() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => arb_counted_status(),
        1 => prop_oneof![
            Just("cancelled"),
            Just("inquiry"),
            Just("declined"),
            Just("expired"),
        ]
        .prop_map(String::from),
    ]
}

/// Amounts in whole cents up to 5,000.
pub fn arb_amount() -> impl Strategy<Value = f64> {
    (0u32..500_000).prop_map(|cents| f64::from(cents) / 100.0)
}

/// A short month label.
pub fn arb_month_label() -> impl Strategy<Value = String> {
    prop::sample::select(MONTH_LABELS.to_vec()).prop_map(String::from)
}

/// Reference instants between 2015 and 2035, at any second of the day.
pub fn arb_reference_now() -> impl Strategy<Value = DateTime<Utc>> {
    (1_420_070_400i64..2_051_222_400i64)
        .prop_map(|secs| DateTime::from_timestamp(secs, 0).unwrap_or_default())
}

/// Dates from `days_back` days before `today` up to `days_ahead` days after.
pub fn arb_date_around(
    today: NaiveDate,
    days_back: i64,
    days_ahead: i64,
) -> impl Strategy<Value = NaiveDate> {
    (-days_back..=days_ahead).prop_map(move |offset| today + chrono::Duration::days(offset))
}

/// Raw reservation objects arriving within ~4 years around `today`.
pub fn arb_reservation(today: NaiveDate) -> impl Strategy<Value = Value> {
    (
        arb_date_around(today, 4 * 366, 30),
        arb_amount(),
        arb_status(),
        any::<bool>(),
    )
        .prop_map(|(date, amount, status, via_payout)| {
            let arrival = date.format("%Y-%m-%d").to_string();
            if via_payout {
                payout_reservation_json(&arrival, amount, amount + 50.0, &status)
            } else {
                reservation_json(&arrival, amount, &status)
            }
        })
}

/// Flat request-param objects with optional null values.
pub fn arb_params_object() -> impl Strategy<Value = Value> {
    prop::collection::btree_map(
        "[a-zA-Z]{1,8}",
        prop_oneof![
            Just(Value::Null),
            any::<i32>().prop_map(Value::from),
            "[a-z0-9]{0,8}".prop_map(Value::from),
            prop::collection::vec(1u32..1000, 0..4).prop_map(Value::from),
        ],
        0..6,
    )
    .prop_map(|map| Value::Object(map.into_iter().collect::<Map<String, Value>>()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counting_fetcher_counts() {
        let fetcher = CountingFetcher::new(7u32);
        let counter = fetcher.call_counter();
        let first: Result<u32, _> = DataFetcher::<(), u32>::fetch(&fetcher, &()).await;
        assert_eq!(first, Ok(7));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scripted_fetcher_plays_in_order() {
        let fetcher = ScriptedFetcher::new()
            .then(Ok(1u32))
            .then_after(Duration::from_millis(50), Err(FetchError::request("down")));

        assert_eq!(DataFetcher::<(), u32>::fetch(&fetcher, &()).await, Ok(1));
        assert!(DataFetcher::<(), u32>::fetch(&fetcher, &()).await.is_err());
        assert_eq!(
            DataFetcher::<(), u32>::fetch(&fetcher, &()).await,
            Err(FetchError::request("script exhausted"))
        );
        assert_eq!(fetcher.calls(), 3);
    }

    #[test]
    fn test_memory_cache_uses_default_prefix() {
        let clock = test_clock(reference_now());
        let (store, _backend) = memory_cache(&clock);
        assert_eq!(store.prefix(), "@roost_cache:");
        assert_eq!(clock.now(), reference_now());
    }
}
