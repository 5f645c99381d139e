//! Application credential storage for the DFS authentication layer.
//!
//! This crate defines what an application credential is and how it is read
//! from the durable store. It knows nothing about caching or signatures; the
//! `dfs-common-authn` crate builds on it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Request interceptor                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │        dfs-common-authn: AuthGate + CredentialCache         │
//! ├─────────────────────────────────────────────────────────────┤
//! │        dfs-common-storage: CredentialStore trait            │
//! │              (fetch_all, fetch_by_key)                      │
//! ├──────────────────────────┬──────────────────────────────────┤
//! │  MemoryCredentialStore   │   database-backed store          │
//! │        (testing)         │       (deployment)               │
//! └──────────────────────────┴──────────────────────────────────┘
//! ```
//!
//! # Error Handling
//!
//! All store operations return [`StorageResult<T>`]. A store that cannot be
//! reached returns an error; it never pretends the application is missing.
//!
//! # Feature Flags
//!
//! - **`testutil`**: Enables the `testutil` module with shared test helpers (record builders and a
//!   scripted store with failure injection). Enable this in `[dev-dependencies]` for integration
//!   tests.

#![deny(unsafe_code)]

pub mod app;
pub mod error;
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used)]
pub mod testutil;

pub use app::{
    AppStatus, CredentialRecord, CredentialStore, DEFAULT_STORE_TIMEOUT, DeadlineCredentialStore,
    MemoryCredentialStore,
};
pub use error::{BoxError, ConfigError, StorageError, StorageResult};
pub use zeroize::Zeroizing;
