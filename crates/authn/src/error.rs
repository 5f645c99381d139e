//! Authentication infrastructure errors.
//!
//! Expected outcomes of checking a request (unknown app, bad signature,
//! stale timestamp, ...) are *not* errors; they are
//! [`AuthVerdict`](crate::verdict::AuthVerdict) values. This module covers
//! the failures that stop the gate from reaching a verdict at all.

use dfs_common_storage::{ConfigError, StorageError};
use thiserror::Error;

/// Failures that prevent authentication from producing a verdict.
///
/// The request boundary answers these with "service unavailable", never
/// with "unauthorized": a store outage must not look like an unknown app
/// internally, even if the external response hides the difference.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]`; new variants may be added in
/// future minor releases without a semver-breaking change. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    /// The credential store could not be consulted.
    ///
    /// Wraps the original [`StorageError`] to preserve the full error source
    /// chain for debugging and structured logging.
    #[error("Credential store unavailable: {0}")]
    StoreUnavailable(
        /// The underlying storage error.
        #[source]
        StorageError,
    ),

    /// Configuration rejected at construction time.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

impl AuthError {
    /// Creates a [`AuthError::StoreUnavailable`] from a storage error.
    #[must_use]
    pub fn store_unavailable(err: StorageError) -> Self {
        Self::StoreUnavailable(err)
    }

    /// Returns `true` if this error came from the credential store.
    #[must_use]
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }

    /// Returns `true` if retrying may succeed (the store timed out or the
    /// connection failed).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StoreUnavailable(err) if err.is_transient())
    }
}

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        Self::StoreUnavailable(err)
    }
}

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;
