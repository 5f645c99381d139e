//! Shared test utilities for credential store testing.
//!
//! This module provides record builders and [`ScriptedCredentialStore`], a
//! controllable store that counts calls, injects failures, and can hold
//! lookups at a gate. It is feature-gated behind `testutil` to prevent
//! leaking into production builds.
//!
//! # Usage
//!
//! In integration tests, enable the feature in `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! dfs-common-storage = { path = "../storage", features = ["testutil"] }
//! ```
//!
//! Then import helpers:
//!
//! ```no_run
//! // Requires the `testutil` feature to be enabled.
//! use dfs_common_storage::testutil::{ScriptedCredentialStore, active_record};
//! ```

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::{
    app::{AppStatus, CredentialRecord, CredentialStore, MemoryCredentialStore},
    error::{StorageError, StorageResult},
};

/// Builds an active record with the given key and secret.
#[must_use]
pub fn active_record(app_key: &str, secret: &str) -> CredentialRecord {
    CredentialRecord::builder().app_key(app_key).app_secret(secret.to_owned()).build()
}

/// Builds a disabled record with the given key and secret.
#[must_use]
pub fn disabled_record(app_key: &str, secret: &str) -> CredentialRecord {
    CredentialRecord::builder()
        .app_key(app_key)
        .app_secret(secret.to_owned())
        .status(AppStatus::Disabled)
        .build()
}

/// Generates a random 32-character hex secret.
#[must_use]
pub fn random_secret() -> String {
    let bytes: [u8; 16] = rand::random();
    hex::encode(bytes)
}

/// Failure a [`ScriptedCredentialStore`] reports instead of answering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedFailure {
    /// `StorageError::Connection`
    Connection,
    /// `StorageError::Timeout`
    Timeout,
    /// `StorageError::Internal`
    Internal,
}

impl InjectedFailure {
    fn to_error(self) -> StorageError {
        match self {
            Self::Connection => StorageError::connection("injected connection failure"),
            Self::Timeout => StorageError::timeout(),
            Self::Internal => StorageError::internal("injected internal failure"),
        }
    }
}

/// A [`CredentialStore`] with knobs for tests.
///
/// Wraps a [`MemoryCredentialStore`] (reachable through
/// [`inner`](Self::inner)) and adds:
///
/// - per-operation call counters,
/// - injectable failures for either operation,
/// - a gate: when enabled, `fetch_by_key` signals
///   [`started`](Self::started) and then waits for [`release`](Self::release),
/// - a fixed artificial latency,
/// - misrouting: `fetch_by_key` answers with a different key's row.
#[derive(Default)]
pub struct ScriptedCredentialStore {
    inner: MemoryCredentialStore,
    fetch_all_calls: AtomicUsize,
    fetch_by_key_calls: AtomicUsize,
    fail_fetch_all: Mutex<Option<InjectedFailure>>,
    fail_fetch_by_key: Mutex<Option<InjectedFailure>>,
    delay: Mutex<Duration>,
    misroute_to: Mutex<Option<String>>,
    gate_enabled: AtomicBool,
    started_notify: Arc<Notify>,
    gate_notify: Arc<Notify>,
}

impl ScriptedCredentialStore {
    /// Creates an empty scripted store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scripted store pre-populated with `records`.
    #[must_use]
    pub fn with_records(records: impl IntoIterator<Item = CredentialRecord>) -> Self {
        Self { inner: MemoryCredentialStore::with_records(records), ..Self::default() }
    }

    /// The backing table.
    pub fn inner(&self) -> &MemoryCredentialStore {
        &self.inner
    }

    /// Number of `fetch_all` calls so far.
    pub fn fetch_all_calls(&self) -> usize {
        self.fetch_all_calls.load(Ordering::SeqCst)
    }

    /// Number of `fetch_by_key` calls so far.
    pub fn fetch_by_key_calls(&self) -> usize {
        self.fetch_by_key_calls.load(Ordering::SeqCst)
    }

    /// Makes `fetch_all` fail (or succeed again with `None`).
    pub fn fail_fetch_all(&self, failure: Option<InjectedFailure>) {
        *self.fail_fetch_all.lock() = failure;
    }

    /// Makes `fetch_by_key` fail (or succeed again with `None`).
    pub fn fail_fetch_by_key(&self, failure: Option<InjectedFailure>) {
        *self.fail_fetch_by_key.lock() = failure;
    }

    /// Adds a fixed latency to every call.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    /// Answers every `fetch_by_key` with the row stored under `app_key`.
    pub fn misroute_lookups_to(&self, app_key: Option<&str>) {
        *self.misroute_to.lock() = app_key.map(str::to_owned);
    }

    /// Holds subsequent `fetch_by_key` calls until [`release`](Self::release).
    pub fn enable_gate(&self) {
        self.gate_enabled.store(true, Ordering::SeqCst);
    }

    /// Waits until a gated `fetch_by_key` has started.
    pub async fn started(&self) {
        self.started_notify.notified().await;
    }

    /// Lets one gated `fetch_by_key` proceed.
    pub fn release(&self) {
        self.gate_notify.notify_one();
    }

    async fn pause(&self) {
        let delay = *self.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl CredentialStore for ScriptedCredentialStore {
    async fn fetch_all(&self) -> StorageResult<Vec<CredentialRecord>> {
        self.fetch_all_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if let Some(failure) = *self.fail_fetch_all.lock() {
            return Err(failure.to_error());
        }
        self.inner.fetch_all().await
    }

    async fn fetch_by_key(&self, app_key: &str) -> StorageResult<Option<CredentialRecord>> {
        self.fetch_by_key_calls.fetch_add(1, Ordering::SeqCst);
        if self.gate_enabled.load(Ordering::SeqCst) {
            self.started_notify.notify_one();
            self.gate_notify.notified().await;
        }
        self.pause().await;
        if let Some(failure) = *self.fail_fetch_by_key.lock() {
            return Err(failure.to_error());
        }
        let routed = self.misroute_to.lock().clone();
        match routed {
            Some(other) => self.inner.fetch_by_key(&other).await,
            None => self.inner.fetch_by_key(app_key).await,
        }
    }
}
