//! Shared test utilities for request authentication testing.
//!
//! This module provides helpers for signing requests the way clients do,
//! building header maps, and wiring a gate over a scripted store. It is
//! feature-gated behind `testutil` to prevent leaking into production
//! builds.
//!
//! # Usage
//!
//! In integration tests, enable the feature in `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! dfs-common-authn = { path = "../authn", features = ["testutil"] }
//! ```
//!
//! Then import helpers:
//!
//! ```no_run
//! // Requires the `testutil` feature to be enabled.
//! use dfs_common_authn::testutil::{sign_request, gate_over};
//! ```

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use dfs_common_storage::{CredentialStore, testutil::ScriptedCredentialStore};

use crate::{
    credential_cache::CredentialCache,
    gate::AuthGate,
    interceptor::{HEADER_APP_KEY, HEADER_SIGN, HEADER_TIMESTAMP},
    signature::{SignatureDigest, compute_signature},
};

/// Unix seconds of the reference request (`2023-11-14T22:13:20Z`).
pub const REFERENCE_UNIX_SECS: i64 = 1_700_000_000;

/// Signs a request with the default digest (MD5), as existing clients do.
#[must_use]
pub fn sign_request(app_key: &str, app_secret: &str, timestamp: &str) -> String {
    compute_signature(SignatureDigest::Md5, app_key, app_secret, timestamp)
}

/// The instant `secs` seconds after the reference request was issued.
///
/// # Panics
///
/// Panics if the result is outside chrono's representable range.
#[must_use]
pub fn reference_plus(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(REFERENCE_UNIX_SECS + secs, 0).expect("timestamp in range")
}

/// Renders `at` as a Unix-seconds timestamp header value.
#[must_use]
pub fn unix_secs(at: DateTime<Utc>) -> String {
    at.timestamp().to_string()
}

/// Builds the three authentication headers of a signed request.
#[must_use]
pub fn signed_headers(
    app_key: &str,
    app_secret: &str,
    timestamp: &str,
) -> HashMap<&'static str, String> {
    HashMap::from([
        (HEADER_APP_KEY, app_key.to_owned()),
        (HEADER_TIMESTAMP, timestamp.to_owned()),
        (HEADER_SIGN, sign_request(app_key, app_secret, timestamp)),
    ])
}

/// Wires an empty cache and a default gate over `store`.
#[must_use]
pub fn gate_over(store: &Arc<ScriptedCredentialStore>) -> AuthGate {
    let cache = CredentialCache::new(Arc::clone(store) as Arc<dyn CredentialStore>);
    AuthGate::new(Arc::new(cache))
}
