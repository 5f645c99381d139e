//! Storage trait for application credential lookups.
//!
//! [`CredentialStore`] is the read-only seam between authentication and the
//! durable application table. Production deployments implement it over
//! their database; [`MemoryCredentialStore`] backs tests and development.
//!
//! # Contract
//!
//! ```text
//! fetch_all()          -> Ok(records) | Err(unavailable)
//! fetch_by_key(key)    -> Ok(Some(record)) | Ok(None) | Err(unavailable)
//! ```
//!
//! An empty `Vec` from `fetch_all` means "no applications are registered".
//! Implementations must never return an empty result to signal that the
//! store could not be reached.

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::{
    app::{AppStatus, CredentialRecord},
    error::StorageResult,
};

/// Read access to the durable application credential table.
///
/// # Error Handling
///
/// Every failure to consult the store (network, timeout, decode) is an
/// `Err`. Absence of a row is `Ok(None)`. Callers rely on this distinction to
/// tell "unknown application" apart from "store down".
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fetches every registered application.
    ///
    /// # Returns
    ///
    /// - `Ok(records)` with all rows (possibly empty)
    /// - `Err(...)` if the store is unavailable
    async fn fetch_all(&self) -> StorageResult<Vec<CredentialRecord>>;

    /// Fetches a single application by key.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(record))` if the application exists
    /// - `Ok(None)` if it doesn't
    /// - `Err(...)` if the store is unavailable
    async fn fetch_by_key(&self, app_key: &str) -> StorageResult<Option<CredentialRecord>>;
}

#[async_trait]
impl<S: CredentialStore + ?Sized> CredentialStore for Arc<S> {
    async fn fetch_all(&self) -> StorageResult<Vec<CredentialRecord>> {
        (**self).fetch_all().await
    }

    async fn fetch_by_key(&self, app_key: &str) -> StorageResult<Option<CredentialRecord>> {
        (**self).fetch_by_key(app_key).await
    }
}

/// In-memory implementation of [`CredentialStore`] for testing.
///
/// Rows are kept in a [`BTreeMap`] so `fetch_all` returns them ordered by
/// app key. Clones share the same underlying table.
///
/// # Thread Safety
///
/// Uses [`parking_lot::RwLock`] for concurrent access with reader-writer
/// semantics.
///
/// # Examples
///
/// ```
/// use dfs_common_storage::app::{CredentialRecord, CredentialStore, MemoryCredentialStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryCredentialStore::new();
///     store.insert(
///         CredentialRecord::builder().app_key("app1").app_secret("s3cr3t".to_owned()).build(),
///     );
///
///     let found = store.fetch_by_key("app1").await?;
///     assert!(found.is_some());
///     Ok(())
/// }
/// ```
#[derive(Debug, Default, Clone)]
pub struct MemoryCredentialStore {
    records: Arc<RwLock<BTreeMap<String, CredentialRecord>>>,
}

impl MemoryCredentialStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `records`.
    #[must_use]
    pub fn with_records(records: impl IntoIterator<Item = CredentialRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    /// Inserts or replaces the row for `record.app_key`.
    ///
    /// Returns the previous row, if any.
    pub fn insert(&self, record: CredentialRecord) -> Option<CredentialRecord> {
        self.records.write().insert(record.app_key.clone(), record)
    }

    /// Removes the row for `app_key`, returning it if present.
    pub fn remove(&self, app_key: &str) -> Option<CredentialRecord> {
        self.records.write().remove(app_key)
    }

    /// Changes the status of an existing row.
    ///
    /// Returns `false` if no row exists for `app_key`.
    pub fn set_status(&self, app_key: &str, status: AppStatus) -> bool {
        match self.records.write().get_mut(app_key) {
            Some(record) => {
                record.status = status;
                true
            },
            None => false,
        }
    }

    /// Removes every row.
    pub fn clear(&self) {
        self.records.write().clear();
    }

    /// Number of stored rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns `true` if the store has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    #[tracing::instrument(skip(self))]
    async fn fetch_all(&self) -> StorageResult<Vec<CredentialRecord>> {
        Ok(self.records.read().values().cloned().collect())
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_by_key(&self, app_key: &str) -> StorageResult<Option<CredentialRecord>> {
        Ok(self.records.read().get(app_key).cloned())
    }
}
