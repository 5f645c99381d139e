//! Storage error types and result alias.
//!
//! Every [`CredentialStore`](crate::app::CredentialStore) implementation maps
//! its internal failures to [`StorageError`]. A store never reports
//! unavailability as an empty result: "no such application" is `Ok(None)` or
//! an empty `Vec`, while "could not ask" is always an `Err`.
//!
//! # Error Types
//!
//! - [`StorageError::Connection`] - Network or connection-related failures
//! - [`StorageError::Serialization`] - Row encoding/decoding failures
//! - [`StorageError::Internal`] - Backend-specific internal errors
//! - [`StorageError::Timeout`] - Operation exceeded its deadline
//!
//! # Example
//!
//! ```
//! use dfs_common_storage::{StorageError, StorageResult};
//!
//! fn lookup(_app_key: &str) -> StorageResult<Vec<u8>> {
//!     Err(StorageError::connection("credential database unreachable"))
//! }
//! ```

use std::sync::Arc;

use thiserror::Error;

/// A boxed error type for source chain tracking.
pub type BoxError = Arc<dyn std::error::Error + Send + Sync>;

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while talking to the durable credential store.
///
/// Errors preserve their source chain via the `#[source]` attribute, enabling
/// debugging tools to display the full error context.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]`; new variants may be added in
/// future minor releases without a semver-breaking change. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    /// Connection or network error.
    ///
    /// The store could not be reached (connection refused, DNS failure,
    /// pool exhausted).
    #[error("Connection error: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
        /// The underlying error that caused this connection failure.
        #[source]
        source: Option<BoxError>,
    },

    /// Serialization or deserialization error.
    ///
    /// A stored row could not be decoded into a
    /// [`CredentialRecord`](crate::app::CredentialRecord). This usually means
    /// data corruption or schema drift.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the serialization error.
        message: String,
        /// The underlying error that caused serialization to fail.
        #[source]
        source: Option<BoxError>,
    },

    /// Internal storage backend error.
    ///
    /// Catch-all for backend-specific errors that don't fit other categories.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
        /// The underlying error that caused this internal failure.
        #[source]
        source: Option<BoxError>,
    },

    /// Operation timed out.
    ///
    /// The store did not answer within the caller's deadline. Callers treat
    /// this exactly like any other unavailability.
    #[error("Operation timeout")]
    Timeout,
}

impl StorageError {
    /// Creates a new `Connection` error with the given message.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection { message: message.into(), source: None }
    }

    /// Creates a new `Connection` error with a message and source error.
    #[must_use]
    pub fn connection_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connection { message: message.into(), source: Some(Arc::new(source)) }
    }

    /// Creates a new `Serialization` error with the given message.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization { message: message.into(), source: None }
    }

    /// Creates a new `Internal` error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into(), source: None }
    }

    /// Creates a new `Timeout` error.
    #[must_use]
    pub fn timeout() -> Self {
        Self::Timeout
    }

    /// Returns `true` for failures that may clear up on retry
    /// (connection and timeout errors).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Timeout)
    }
}

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A numeric or duration setting is below its allowed minimum.
    #[error("{field} must be at least {min}, got {value}")]
    BelowMinimum {
        /// Name of the offending field.
        field: &'static str,
        /// Smallest accepted value, rendered for display.
        min: String,
        /// The value that was supplied.
        value: String,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(StorageError::connection("refused").to_string(), "Connection error: refused");
        assert_eq!(StorageError::timeout().to_string(), "Operation timeout");
        assert_eq!(StorageError::internal("boom").to_string(), "Internal error: boom");
        assert_eq!(
            StorageError::serialization("bad row").to_string(),
            "Serialization error: bad row"
        );
    }

    #[test]
    fn test_source_chain_preserved() {
        let inner = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let err = StorageError::connection_with_source("pool checkout failed", inner);

        let source = err.source().expect("source must be preserved");
        assert_eq!(source.to_string(), "reset by peer");
    }

    #[test]
    fn test_is_transient() {
        assert!(StorageError::connection("x").is_transient());
        assert!(StorageError::timeout().is_transient());
        assert!(!StorageError::internal("x").is_transient());
        assert!(!StorageError::serialization("x").is_transient());
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::BelowMinimum {
            field: "store_timeout",
            min: "1ms".into(),
            value: "0s".into(),
        };
        assert_eq!(err.to_string(), "store_timeout must be at least 1ms, got 0s");
    }
}
