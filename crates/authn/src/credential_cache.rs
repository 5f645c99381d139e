//! In-memory application credential cache.
//!
//! This module provides [`CredentialCache`], which keeps an atomically
//! swappable snapshot of every known application in front of a
//! [`CredentialStore`].
//!
//! # Architecture
//!
//! ```text
//! get(app_key) → load snapshot (lock-free)
//!              → hit?  return shared record
//!              → miss? fetch_by_key from the store
//!                      → found: publish into the snapshot (unless a reload ran meanwhile)
//!
//! reload()     → fetch_all from the store
//!              → build a fresh map, swap it in whole
//! ```
//!
//! # Consistency
//!
//! - Readers never block and never see a half-built snapshot.
//! - Entries are not mutated in place; a changed record replaces its entry.
//! - Nothing expires. Entries leave the cache only through a reload.
//! - A store failure is returned as [`AuthError::StoreUnavailable`], never
//!   as "not found".

use std::{
    collections::HashMap,
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use arc_swap::{ArcSwap, Guard};
use dfs_common_storage::{CredentialRecord, CredentialStore, DeadlineCredentialStore};
use fail::fail_point;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{config::AuthConfig, error::AuthError};

type Snapshot = HashMap<String, Arc<CredentialRecord>>;

/// Shortest interval the background refresh task will tick at.
const MIN_TICK: Duration = Duration::from_millis(1);

/// What [`CredentialCache::reload`] does when the store returns no records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyReloadPolicy {
    /// Treat the empty result as authoritative and drop every entry.
    #[default]
    Clear,
    /// Keep the current snapshot and log a warning.
    Retain,
}

/// Result of a successful [`CredentialCache::reload`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// The snapshot was replaced by `loaded` entries; it held `previous` before.
    Replaced {
        /// Entries in the new snapshot.
        loaded: usize,
        /// Entries in the replaced snapshot.
        previous: usize,
    },
    /// The store was empty and the snapshot was cleared.
    Cleared {
        /// Entries dropped.
        previous: usize,
    },
    /// The store was empty and the snapshot was kept.
    Retained {
        /// Entries still cached.
        current: usize,
    },
}

impl ReloadOutcome {
    /// Number of entries cached once the reload finished.
    #[must_use]
    pub fn entry_count(self) -> usize {
        match self {
            Self::Replaced { loaded, .. } => loaded,
            Self::Cleared { .. } => 0,
            Self::Retained { current } => current,
        }
    }
}

/// Point-in-time counters for a [`CredentialCache`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the snapshot.
    pub hits: u64,
    /// Lookups that went to the store.
    pub misses: u64,
    /// Single-record store fetches issued.
    pub store_fetches: u64,
    /// Successful reloads, manual or background.
    pub reloads: u64,
    /// Background refresh cycles that failed.
    pub refresh_errors: u64,
}

/// Cache of application credentials keyed by application key.
///
/// Create one per process, share it behind an [`Arc`], call
/// [`reload`](Self::reload) at startup, and hand it to
/// [`AuthGate`](crate::AuthGate). Misses are filled lazily from the store.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use dfs_common_authn::CredentialCache;
/// use dfs_common_storage::CredentialStore;
///
/// async fn example(store: Arc<dyn CredentialStore>) -> Result<(), dfs_common_authn::AuthError> {
///     let cache = Arc::new(CredentialCache::new(store));
///     cache.reload().await?;
///
///     if let Some(record) = cache.get("app1").await? {
///         println!("{} is {}", record.app_key, record.status);
///     }
///     Ok(())
/// }
/// ```
pub struct CredentialCache {
    /// Current snapshot. Swapped whole on reload, copied on lazy insert.
    snapshot: ArcSwap<Snapshot>,
    /// Source of truth.
    store: Arc<dyn CredentialStore>,
    /// Bumped by every reload that changes the snapshot.
    ///
    /// A lazy fetch records the generation before calling the store and
    /// skips its write-back if the value moved, so a record read before a
    /// reload never lands in the snapshot that reload produced.
    generation: AtomicU64,
    empty_reload: EmptyReloadPolicy,
    hits: AtomicU64,
    misses: AtomicU64,
    store_fetches: AtomicU64,
    reloads: AtomicU64,
    refresh_errors: AtomicU64,
    /// Stops the background refresh task.
    cancel_token: CancellationToken,
    /// Wrapped in `Mutex` so `shutdown()` can take ownership via `&self`.
    refresh_handle: Mutex<Option<JoinHandle<()>>>,
}

impl CredentialCache {
    /// Creates an empty cache over `store` with the default empty-reload policy.
    ///
    /// The store is called as-is; wrap it in a
    /// [`DeadlineCredentialStore`] or use [`from_config`](Self::from_config)
    /// to bound store latency.
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(Snapshot::new()),
            store,
            generation: AtomicU64::new(0),
            empty_reload: EmptyReloadPolicy::default(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            store_fetches: AtomicU64::new(0),
            reloads: AtomicU64::new(0),
            refresh_errors: AtomicU64::new(0),
            cancel_token: CancellationToken::new(),
            refresh_handle: Mutex::new(None),
        }
    }

    /// Sets the policy for empty reload results.
    #[must_use]
    pub fn with_empty_reload(mut self, policy: EmptyReloadPolicy) -> Self {
        self.empty_reload = policy;
        self
    }

    /// Builds a cache from configuration.
    ///
    /// The store is wrapped in a [`DeadlineCredentialStore`] with
    /// `config.store_timeout`. When `config.refresh_interval` is set, the
    /// background refresh task is started, which requires a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidConfig`] if the config fails validation.
    pub fn from_config(
        store: Arc<dyn CredentialStore>,
        config: &AuthConfig,
    ) -> Result<Arc<Self>, AuthError> {
        config.validate()?;
        let store: Arc<dyn CredentialStore> =
            Arc::new(DeadlineCredentialStore::new(store, config.store_timeout));
        let cache = Arc::new(Self::new(store).with_empty_reload(config.empty_reload));
        Ok(match config.refresh_interval {
            Some(interval) => cache.with_refresh_interval(interval),
            None => cache,
        })
    }

    /// Looks up the credentials for `app_key`.
    ///
    /// Serves from the snapshot when possible. On a miss, issues exactly one
    /// `fetch_by_key` and publishes a found record before returning it.
    /// Absent applications are not remembered; the next lookup asks the
    /// store again.
    ///
    /// An empty `app_key` returns `Ok(None)` without touching the store.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::StoreUnavailable`] if the store call fails.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, app_key: &str) -> Result<Option<Arc<CredentialRecord>>, AuthError> {
        if app_key.is_empty() {
            return Ok(None);
        }

        if let Some(record) = self.snapshot.load().get(app_key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(cache = "snapshot", "cache hit");
            return Ok(Some(Arc::clone(record)));
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(cache = "snapshot", "cache miss");

        let gen_before = self.generation.load(Ordering::Acquire);

        fail_point!("cache-before-store-fetch", |_| {
            Err(AuthError::store_unavailable(dfs_common_storage::StorageError::internal(
                "injected failure before store fetch",
            )))
        });
        self.store_fetches.fetch_add(1, Ordering::Relaxed);
        let fetched = self.store.fetch_by_key(app_key).await.map_err(AuthError::store_unavailable)?;

        let Some(record) = fetched else {
            tracing::debug!(cache = "store", "application not found");
            return Ok(None);
        };

        if record.app_key != app_key {
            tracing::warn!(
                returned_key = %record.app_key,
                "store returned a record for a different application key; ignoring it"
            );
            return Ok(None);
        }

        let record = Arc::new(record);
        self.publish(app_key, &record, gen_before);
        Ok(Some(record))
    }

    /// Inserts a lazily fetched record unless a reload happened since
    /// `gen_before` was read.
    fn publish(&self, app_key: &str, record: &Arc<CredentialRecord>, gen_before: u64) {
        let mut current = self.snapshot.load_full();
        loop {
            if self.generation.load(Ordering::Acquire) != gen_before {
                tracing::debug!(
                    cache = "store",
                    "discarding fetched record: cache reloaded during fetch"
                );
                return;
            }

            let mut next = Snapshot::clone(&current);
            next.insert(app_key.to_owned(), Arc::clone(record));

            let previous = self.snapshot.compare_and_swap(&current, Arc::new(next));
            if Arc::ptr_eq(&previous, &current) {
                tracing::debug!(cache = "store", "cached fetched record");
                return;
            }
            // Another writer got in first; retry on top of its snapshot.
            current = Guard::into_inner(previous);
        }
    }

    /// Replaces the snapshot with everything the store holds.
    ///
    /// A non-empty result becomes the new snapshot in one atomic swap. An
    /// empty result is handled per [`EmptyReloadPolicy`]. Duplicate keys keep
    /// the last record. Records with an empty key are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::StoreUnavailable`] if `fetch_all` fails. The
    /// current snapshot is left untouched.
    #[tracing::instrument(skip(self))]
    pub async fn reload(&self) -> Result<ReloadOutcome, AuthError> {
        let records = self.store.fetch_all().await.map_err(AuthError::store_unavailable)?;
        let previous = self.snapshot.load().len();

        let outcome = if records.is_empty() {
            match self.empty_reload {
                EmptyReloadPolicy::Clear => {
                    self.swap_in(Snapshot::new());
                    if previous > 0 {
                        tracing::warn!(
                            previous,
                            "store reported no applications; cleared credential cache"
                        );
                    }
                    ReloadOutcome::Cleared { previous }
                },
                EmptyReloadPolicy::Retain => {
                    tracing::warn!(
                        current = previous,
                        "store reported no applications; keeping current credential cache"
                    );
                    ReloadOutcome::Retained { current: previous }
                },
            }
        } else {
            let next = build_snapshot(records);
            let loaded = next.len();
            self.swap_in(next);
            ReloadOutcome::Replaced { loaded, previous }
        };

        self.reloads.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            entries = outcome.entry_count(),
            previous,
            outcome = ?outcome,
            "credential cache reloaded"
        );
        Ok(outcome)
    }

    fn swap_in(&self, next: Snapshot) {
        // Bump first so in-flight lazy fetches see the change before they
        // can publish into the new map.
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.snapshot.store(Arc::new(next));
    }

    /// Starts a background task that calls [`reload`](Self::reload) every
    /// `interval`, beginning one interval from now.
    ///
    /// A failed cycle is logged, counted in [`CacheStats::refresh_errors`],
    /// and leaves the snapshot as it was. The task holds only a weak
    /// reference and ends on [`shutdown`](Self::shutdown) or once the
    /// cache is dropped. A zero interval is treated as one millisecond.
    ///
    /// Calling this again replaces the running task: the previous one is
    /// aborted and only the new interval stays in effect.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn with_refresh_interval(self: Arc<Self>, interval: Duration) -> Arc<Self> {
        let cache = Arc::downgrade(&self);
        let token = self.cancel_token.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval.max(MIN_TICK));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately; consume it so we start
            // with a full interval wait.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        tracing::info!("background refresh task shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        let Some(cache) = cache.upgrade() else {
                            break;
                        };
                        cache.refresh_once().await;
                    }
                }
            }
        });

        if let Some(previous) = self.refresh_handle.lock().replace(handle) {
            previous.abort();
            tracing::debug!("replaced existing background refresh task");
        }
        self
    }

    async fn refresh_once(&self) {
        match self.reload().await {
            Ok(outcome) => {
                tracing::debug!(outcome = ?outcome, "background refresh complete");
            },
            Err(err) => {
                self.refresh_errors.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    error = %err,
                    transient = err.is_transient(),
                    "background refresh failed; keeping current snapshot"
                );
            },
        }
    }

    /// Stops the background refresh task, if any, and waits for it to exit.
    ///
    /// Cached entries stay available.
    pub async fn shutdown(&self) {
        self.cancel_token.cancel();
        // Take the handle so we can await it without holding the lock.
        let handle = self.refresh_handle.lock().take();
        if let Some(handle) = handle
            && let Err(err) = handle.await
        {
            tracing::warn!(error = %err, "background refresh task panicked");
        }
    }

    /// Number of cached applications.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.snapshot.load().len()
    }

    /// Returns `true` if `app_key` is cached. Never consults the store.
    #[must_use]
    pub fn contains(&self, app_key: &str) -> bool {
        self.snapshot.load().contains_key(app_key)
    }

    /// The configured empty-reload policy.
    #[must_use]
    pub fn empty_reload_policy(&self) -> EmptyReloadPolicy {
        self.empty_reload
    }

    /// Snapshot of the cache counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            store_fetches: self.store_fetches.load(Ordering::Relaxed),
            reloads: self.reloads.load(Ordering::Relaxed),
            refresh_errors: self.refresh_errors.load(Ordering::Relaxed),
        }
    }
}

impl Drop for CredentialCache {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

impl fmt::Debug for CredentialCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialCache")
            .field("entries", &self.entry_count())
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .field("empty_reload", &self.empty_reload)
            .finish_non_exhaustive()
    }
}

fn build_snapshot(records: Vec<CredentialRecord>) -> Snapshot {
    let mut next = Snapshot::with_capacity(records.len());
    for record in records {
        if record.app_key.is_empty() {
            tracing::warn!("skipping credential record with an empty application key");
            continue;
        }
        let record = Arc::new(record);
        if let Some(replaced) = next.insert(record.app_key.clone(), Arc::clone(&record)) {
            tracing::warn!(
                app_key = %replaced.app_key,
                "duplicate application key in bulk load; keeping the last record"
            );
        }
    }
    next
}
