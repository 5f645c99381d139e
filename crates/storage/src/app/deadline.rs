//! Deadline decorator for [`CredentialStore`] implementations.
//!
//! The authentication core imposes no timeout of its own. This wrapper puts
//! a fixed deadline on every store call and reports an overrun as
//! [`StorageError::Timeout`], so a hung database surfaces as unavailability
//! rather than a stalled request.

use std::{future::Future, time::Duration};

use async_trait::async_trait;

use super::{record::CredentialRecord, store::CredentialStore};
use crate::error::{StorageError, StorageResult};

/// Default per-call deadline (5 seconds).
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Decorator that bounds every call on the inner store by `timeout`.
///
/// # Usage
///
/// ```no_run
/// use std::time::Duration;
/// use dfs_common_storage::app::{DeadlineCredentialStore, MemoryCredentialStore};
///
/// let store = DeadlineCredentialStore::new(MemoryCredentialStore::new(), Duration::from_secs(2));
/// ```
#[derive(Debug, Clone)]
pub struct DeadlineCredentialStore<S> {
    inner: S,
    timeout: Duration,
}

impl<S: CredentialStore> DeadlineCredentialStore<S> {
    /// Wraps `inner` with the given per-call deadline.
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// Returns a reference to the inner store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Returns the configured deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = StorageResult<T>> + Send,
    ) -> StorageResult<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_elapsed) => {
                tracing::warn!(
                    operation,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "credential store call exceeded deadline"
                );
                Err(StorageError::timeout())
            },
        }
    }
}

#[async_trait]
impl<S: CredentialStore> CredentialStore for DeadlineCredentialStore<S> {
    async fn fetch_all(&self) -> StorageResult<Vec<CredentialRecord>> {
        self.bounded("fetch_all", self.inner.fetch_all()).await
    }

    async fn fetch_by_key(&self, app_key: &str) -> StorageResult<Option<CredentialRecord>> {
        self.bounded("fetch_by_key", self.inner.fetch_by_key(app_key)).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::app::MemoryCredentialStore;

    /// Store whose calls never finish.
    struct HangingStore;

    #[async_trait]
    impl CredentialStore for HangingStore {
        async fn fetch_all(&self) -> StorageResult<Vec<CredentialRecord>> {
            std::future::pending().await
        }

        async fn fetch_by_key(&self, _app_key: &str) -> StorageResult<Option<CredentialRecord>> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_fetch_by_key_times_out() {
        let store = DeadlineCredentialStore::new(HangingStore, Duration::from_millis(100));

        let result = store.fetch_by_key("app1").await;

        assert!(matches!(result, Err(StorageError::Timeout)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_fetch_all_times_out() {
        let store = DeadlineCredentialStore::new(HangingStore, Duration::from_millis(100));

        let result = store.fetch_all().await;

        assert!(matches!(result, Err(StorageError::Timeout)));
    }

    #[tokio::test]
    async fn test_fast_store_passes_through() {
        let inner = MemoryCredentialStore::with_records([CredentialRecord::builder()
            .app_key("app1")
            .app_secret("s3cr3t".to_owned())
            .build()]);
        let store = DeadlineCredentialStore::new(inner, DEFAULT_STORE_TIMEOUT);

        assert!(store.fetch_by_key("app1").await.unwrap().is_some());
        assert!(store.fetch_by_key("other").await.unwrap().is_none());
        assert_eq!(store.fetch_all().await.unwrap().len(), 1);
        assert_eq!(store.timeout(), DEFAULT_STORE_TIMEOUT);
    }
}
