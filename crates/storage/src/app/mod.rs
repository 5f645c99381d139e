//! Application credential types and store access.
//!
//! This module contains the record type for registered applications and the
//! read-only store trait the authentication gate pulls them through.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  fetch_all / fetch_by_key  ┌──────────────────────┐
//! │ Credential   │───────────────────────────►│ CredentialStore      │
//! │ cache (authn)│                            │ (database / memory)  │
//! └──────────────┘                            └──────────────────────┘
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use std::time::Duration;
//! use dfs_common_storage::app::{
//!     CredentialRecord, CredentialStore, DeadlineCredentialStore, MemoryCredentialStore,
//! };
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let memory = MemoryCredentialStore::new();
//! memory.insert(
//!     CredentialRecord::builder().app_key("app1").app_secret("s3cr3t".to_owned()).build(),
//! );
//!
//! let store = DeadlineCredentialStore::new(memory, Duration::from_secs(2));
//! let record = store.fetch_by_key("app1").await.unwrap();
//! assert!(record.is_some());
//! # });
//! ```

mod deadline;
mod record;
mod store;

pub use deadline::{DEFAULT_STORE_TIMEOUT, DeadlineCredentialStore};
pub use record::{AppStatus, CredentialRecord};
pub use store::{CredentialStore, MemoryCredentialStore};
