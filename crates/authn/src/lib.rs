//! # DFS Common Authentication
//!
//! Application credential caching and signed-request verification for the
//! DFS service.
//!
//! This crate provides:
//! - **Credential cache**: atomically reloadable snapshot of application credentials, filled lazily
//!   from the store on a miss
//! - **Verification gate**: ordered checks of application key, status, signature, and timestamp
//!   freshness, producing one [`AuthVerdict`] per request
//! - **Boundary helpers**: header names and the verdict-to-response mapping used by the request
//!   interceptor
//!
//! ## Signing scheme
//!
//! Clients send `appKey`, `timestamp`, and `sign`, where
//! `sign = hex(md5(appKey + "$" + appSecret + "$" + timestamp))`. SHA-256
//! can be configured instead (see [`SignatureDigest`]).
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use dfs_common_authn::{AuthConfig, AuthGate, AuthVerdict, CredentialCache};
//! use dfs_common_storage::{CredentialStore, MemoryCredentialStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::new());
//! let config = AuthConfig::default();
//!
//! let cache = CredentialCache::from_config(store, &config)?;
//! cache.reload().await?;
//! let gate = AuthGate::from_config(cache, &config)?;
//!
//! let verdict = gate.verify("app1", "1700000000", "b37039718d6a29c2b570bd4bc3ef8a7e").await?;
//! if verdict != AuthVerdict::Ok {
//!     println!("rejected with {}", verdict.code());
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Authentication configuration.
pub mod config;
/// Application credential cache.
pub mod credential_cache;
/// Authentication error types.
pub mod error;
/// Request verification.
pub mod gate;
/// Request boundary helpers.
pub mod interceptor;
/// Signature digests.
pub mod signature;
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used)]
pub mod testutil;
/// Timestamp parsing and freshness.
pub mod timestamp;
/// Verification outcomes.
pub mod verdict;

// Re-export key types for convenience
pub use config::AuthConfig;
pub use credential_cache::{CacheStats, CredentialCache, EmptyReloadPolicy, ReloadOutcome};
pub use error::{AuthError, Result};
pub use gate::AuthGate;
pub use interceptor::{Admission, RequestCredentials, admit};
pub use signature::SignatureDigest;
pub use timestamp::DEFAULT_FRESHNESS_WINDOW;
pub use verdict::AuthVerdict;
