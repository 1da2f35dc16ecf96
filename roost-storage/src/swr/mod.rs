//! Stale-while-revalidate controller.
//!
//! A [`CachedResource`] owns one logical resource: a base key, the current
//! request params and a fetch function. Activation publishes whatever the
//! cache holds right away, then decides whether the network is needed:
//!
//! - cache miss: foreground fetch with a loading indicator
//! - stale hit: background fetch, the cached data stays visible
//! - fresh hit: nothing
//!
//! Fetch starts are throttled per resource, and every fetch carries a
//! sequence number so a slow response can never overwrite a newer one.

mod fetcher;
mod state;

pub use fetcher::{fetcher_fn, DataFetcher, FnFetcher};
pub use state::{ResourceOptions, ResourceState};

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use roost_core::{Clock, RoostResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

use crate::cache::{CacheKey, CacheStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchKind {
    Foreground,
    Background,
}

/// Permission to run one fetch, handed out by [`Shared::begin_fetch`].
#[derive(Debug, Clone, Copy)]
struct FetchTicket {
    sequence: u64,
    kind: FetchKind,
}

/// Bookkeeping shared by every fetch of one resource.
#[derive(Debug, Default)]
struct FetchGuard {
    last_started: Option<DateTime<Utc>>,
    next_sequence: u64,
    /// Results with a sequence at or below this are discarded.
    applied_sequence: u64,
    /// Sequence of the newest foreground fetch still running.
    foreground_in_flight: Option<u64>,
    dependencies: Option<u64>,
    background: Option<JoinHandle<()>>,
}

struct Shared<T, P, F> {
    base_key: String,
    store: CacheStore,
    clock: Arc<dyn Clock>,
    fetcher: F,
    options: ResourceOptions,
    params: RwLock<P>,
    state: watch::Sender<ResourceState<T>>,
    guard: Mutex<FetchGuard>,
    /// Signalled whenever a foreground fetch finishes.
    foreground_done: Notify,
}

/// Cache-first handle on one remote resource.
///
/// Cheap to clone; clones drive the same state.
///
/// # Example
///
/// ```ignore
/// let resource = CachedResource::new(
///     store,
///     "monthly_revenue",
///     fetcher_fn(|p: RevenueParams| async move { client.monthly(&p).await }),
///     RevenueParams::default(),
///     ResourceOptions::from_config(&config),
/// );
/// let state = resource.mount().await;
/// ```
pub struct CachedResource<T, P, F> {
    shared: Arc<Shared<T, P, F>>,
}

impl<T, P, F> Clone for CachedResource<T, P, F> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, P, F> CachedResource<T, P, F>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    P: Clone + Serialize + Send + Sync + 'static,
    F: DataFetcher<P, T> + 'static,
{
    /// Create an idle resource. Nothing is read or fetched until
    /// [`mount`](Self::mount) or an explicit call.
    pub fn new(
        store: CacheStore,
        base_key: impl Into<String>,
        fetcher: F,
        params: P,
        options: ResourceOptions,
    ) -> Self {
        let clock = Arc::clone(store.clock());
        let (state, _) = watch::channel(ResourceState::default());
        Self {
            shared: Arc::new(Shared {
                base_key: base_key.into(),
                store,
                clock,
                fetcher,
                options,
                params: RwLock::new(params),
                state,
                guard: Mutex::new(FetchGuard::default()),
                foreground_done: Notify::new(),
            }),
        }
    }

    /// Cache key for the current params.
    pub fn key(&self) -> CacheKey {
        self.shared.key()
    }

    pub fn params(&self) -> P {
        self.shared.current_params()
    }

    pub fn options(&self) -> &ResourceOptions {
        &self.shared.options
    }

    /// Current published state.
    pub fn state(&self) -> ResourceState<T> {
        self.shared.state.borrow().clone()
    }

    /// Current published data.
    pub fn data(&self) -> Option<T> {
        self.shared.state.borrow().data.clone()
    }

    /// Receive every state change from now on.
    pub fn subscribe(&self) -> watch::Receiver<ResourceState<T>> {
        self.shared.state.subscribe()
    }

    /// First activation. A no-op when `auto_fetch` is off.
    pub async fn mount(&self) -> ResourceState<T> {
        if self.shared.options.auto_fetch {
            self.load_cached_and_fetch().await
        } else {
            self.state()
        }
    }

    /// Publish cached data if any, then fetch in the foreground (miss) or
    /// background (stale hit).
    ///
    /// Returns the state once the cache read and any foreground fetch are
    /// done. Background refreshes keep running after this returns.
    pub async fn load_cached_and_fetch(&self) -> ResourceState<T> {
        let key = self.shared.key();

        match self.shared.store.get::<T>(&key).await {
            Some(entry) => {
                let written_at = self
                    .shared
                    .store
                    .get_meta(&key)
                    .await
                    .map(|meta| meta.timestamp)
                    .unwrap_or(entry.timestamp);

                self.shared.publish_cached(entry.data, entry.timestamp);

                let age = elapsed(self.shared.clock.now(), written_at);
                if age.map_or(false, |age| age > self.shared.options.max_age) {
                    tracing::debug!(key = %key.entry_key(), "Cached data is stale, refreshing in background");
                    self.spawn_background_refresh();
                }
            }
            None => {
                tracing::debug!(key = %key.entry_key(), "Cache miss, fetching");
                self.shared.wait_for_superseded_foreground().await;
                match self.shared.begin_fetch(FetchKind::Foreground) {
                    Some(ticket) => self.shared.run_fetch(ticket, true).await,
                    None => {
                        tracing::debug!(key = %key.entry_key(), "Fetch throttled");
                    }
                }
            }
        }

        self.state()
    }

    /// Explicit foreground fetch.
    ///
    /// Within the throttle window this does nothing and returns the current
    /// in-memory data.
    pub async fn refetch(&self, show_loading: bool) -> Option<T> {
        self.shared.wait_for_superseded_foreground().await;
        match self.shared.begin_fetch(FetchKind::Foreground) {
            Some(ticket) => self.shared.run_fetch(ticket, show_loading).await,
            None => {
                tracing::debug!(key = %self.shared.key().entry_key(), "Refetch throttled");
            }
        }
        self.data()
    }

    /// Replace the request params.
    ///
    /// A different cache key resets the throttle and the published state,
    /// discards in-flight results for the old params and re-activates when
    /// `auto_fetch` is on. A foreground fetch for the new key waits for a
    /// still-running fetch of the old key to finish.
    pub async fn set_params(&self, params: P) -> ResourceState<T> {
        let old_key = self.shared.key();
        {
            let mut current = self
                .shared
                .params
                .write()
                .unwrap_or_else(|e| e.into_inner());
            *current = params;
        }
        let new_key = self.shared.key();
        if new_key == old_key {
            return self.state();
        }

        {
            let mut guard = self.shared.lock_guard();
            guard.last_started = None;
            guard.applied_sequence = guard.next_sequence;
        }
        self.shared.state.send_replace(ResourceState::default());
        tracing::debug!(from = %old_key.entry_key(), to = %new_key.entry_key(), "Params changed");

        if self.shared.options.auto_fetch {
            self.load_cached_and_fetch().await
        } else {
            self.state()
        }
    }

    /// Record the caller's dependency values; re-activates when they differ
    /// from the last recorded ones and `auto_fetch` is on.
    pub async fn set_dependencies<D: Hash + ?Sized>(&self, deps: &D) -> ResourceState<T> {
        let mut hasher = DefaultHasher::new();
        deps.hash(&mut hasher);
        let fingerprint = hasher.finish();

        let changed = {
            let mut guard = self.shared.lock_guard();
            let changed = guard.dependencies != Some(fingerprint);
            guard.dependencies = Some(fingerprint);
            changed
        };

        if changed && self.shared.options.auto_fetch {
            self.load_cached_and_fetch().await
        } else {
            self.state()
        }
    }

    /// Drop the cached entry for the current params. In-memory state is kept.
    pub async fn invalidate(&self) -> RoostResult<()> {
        self.shared.store.remove(&self.shared.key()).await
    }

    /// Wait for the most recently spawned background refresh, if any.
    pub async fn wait_for_background(&self) {
        let handle = self.shared.lock_guard().background.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Background refresh task failed");
            }
        }
    }

    fn spawn_background_refresh(&self) -> bool {
        let Some(ticket) = self.shared.begin_fetch(FetchKind::Background) else {
            tracing::debug!(key = %self.shared.key().entry_key(), "Background refresh skipped");
            return false;
        };

        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(async move {
            shared.run_fetch(ticket, false).await;
        });
        self.shared.lock_guard().background = Some(handle);
        true
    }
}

impl<T, P, F> Shared<T, P, F>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    P: Clone + Serialize + Send + Sync + 'static,
    F: DataFetcher<P, T> + 'static,
{
    fn lock_guard(&self) -> MutexGuard<'_, FetchGuard> {
        self.guard.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn current_params(&self) -> P {
        self.params
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn key(&self) -> CacheKey {
        CacheKey::new(self.base_key.as_str(), &self.current_params())
    }

    /// Publish cached data unless the in-memory copy is at least as new.
    fn publish_cached(&self, data: T, written_at: DateTime<Utc>) {
        let foreground_running = self.lock_guard().foreground_in_flight.is_some();
        self.state.send_if_modified(|s| {
            if s.updated_at.map_or(false, |current| current >= written_at) {
                return false;
            }
            s.data = Some(data);
            s.updated_at = Some(written_at);
            s.is_fresh_data = false;
            if !foreground_running {
                s.is_loading = false;
            }
            true
        });
    }

    /// Wait until no superseded foreground fetch is running.
    async fn wait_for_superseded_foreground(&self) {
        loop {
            let finished = self.foreground_done.notified();
            {
                let guard = self.lock_guard();
                match guard.foreground_in_flight {
                    Some(sequence) if sequence <= guard.applied_sequence => {}
                    _ => return,
                }
            }
            tracing::debug!(key = %self.key().entry_key(), "Waiting for superseded fetch");
            finished.await;
        }
    }

    /// Apply the throttle and hand out a sequence number.
    fn begin_fetch(&self, kind: FetchKind) -> Option<FetchTicket> {
        let now = self.clock.now();
        let mut guard = self.lock_guard();

        // One foreground fetch at a time; background never overlaps it
        if guard.foreground_in_flight.is_some() {
            return None;
        }
        if let Some(last) = guard.last_started {
            if elapsed(now, last).map_or(false, |since| since < self.options.throttle_window) {
                return None;
            }
        }

        guard.last_started = Some(now);
        guard.next_sequence += 1;
        let sequence = guard.next_sequence;
        if kind == FetchKind::Foreground {
            guard.foreground_in_flight = Some(sequence);
        }
        Some(FetchTicket { sequence, kind })
    }

    async fn run_fetch(&self, ticket: FetchTicket, show_loading: bool) {
        if show_loading {
            self.state.send_modify(|s| s.is_loading = true);
        }

        let params = self.current_params();
        let key = CacheKey::new(self.base_key.as_str(), &params);
        let result = self.fetcher.fetch(&params).await;
        let fetched_at = self.clock.now();

        let (current, foreground_running, finished_foreground) = {
            let mut guard = self.lock_guard();
            let finished_foreground = guard.foreground_in_flight == Some(ticket.sequence);
            if finished_foreground {
                guard.foreground_in_flight = None;
            }
            let current = ticket.sequence > guard.applied_sequence;
            if current && result.is_ok() {
                guard.applied_sequence = ticket.sequence;
            }
            (current, guard.foreground_in_flight.is_some(), finished_foreground)
        };
        if finished_foreground {
            self.foreground_done.notify_waiters();
        }

        match result {
            Ok(data) if current => {
                let persisted = data.clone();
                self.state.send_modify(|s| {
                    s.data = Some(data);
                    s.is_fresh_data = true;
                    s.error = None;
                    s.updated_at = Some(fetched_at);
                    if !foreground_running {
                        s.is_loading = false;
                    }
                });
                if let Err(e) = self.store.put_at(&key, &persisted, fetched_at).await {
                    tracing::warn!(key = %key.entry_key(), error = %e, "Failed to persist fetched data");
                }
                tracing::debug!(key = %key.entry_key(), sequence = ticket.sequence, "Fetch applied");
            }
            Ok(_) => {
                tracing::debug!(key = %key.entry_key(), sequence = ticket.sequence, "Superseded fetch result discarded");
                self.clear_loading(foreground_running);
            }
            Err(e) => match ticket.kind {
                FetchKind::Foreground if current => {
                    tracing::warn!(key = %key.entry_key(), error = %e, "Fetch failed");
                    self.state.send_modify(|s| {
                        s.error = Some(e);
                        if !foreground_running {
                            s.is_loading = false;
                        }
                    });
                }
                FetchKind::Foreground => {
                    tracing::debug!(key = %key.entry_key(), error = %e, "Superseded fetch failed");
                    self.clear_loading(foreground_running);
                }
                FetchKind::Background => {
                    tracing::warn!(key = %key.entry_key(), error = %e, "Background refresh failed");
                }
            },
        }
    }

    fn clear_loading(&self, foreground_running: bool) {
        if !foreground_running {
            self.state.send_if_modified(|s| std::mem::replace(&mut s.is_loading, false));
        }
    }
}

/// Time from `earlier` to `now`; `None` when the clock went backwards.
fn elapsed(now: DateTime<Utc>, earlier: DateTime<Utc>) -> Option<Duration> {
    (now - earlier).to_std().ok()
}
