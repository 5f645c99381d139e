//! Request signature verification.
//!
//! [`AuthGate`] turns the three authentication fields of a request into a
//! single [`AuthVerdict`]. Checks run in a fixed order and stop at the
//! first failure:
//!
//! ```text
//! 0. any field empty                         → MalformedRequest
//! 1. cache lookup                 absent     → AppNotFound
//! 2. status                       not active → AppDisabled
//! 3. signature over key$secret$timestamp     → SignatureMismatch
//! 4. timestamp parse              fails      → MalformedRequest
//!    freshness                    outside    → TimestampInvalid
//! 5.                                         → Ok
//! ```
//!
//! The signature is checked before freshness, so an expired request never
//! reveals whether its signature would have matched.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};

use crate::{
    config::AuthConfig,
    credential_cache::CredentialCache,
    error::AuthError,
    signature::{SignatureDigest, compute_signature, signatures_match},
    timestamp::{DEFAULT_FRESHNESS_WINDOW, check_freshness, parse_timestamp},
    verdict::AuthVerdict,
};

/// Verifies signed requests against a [`CredentialCache`].
///
/// The gate holds no per-request state. Share one instance across every
/// request handler.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use dfs_common_authn::{AuthGate, AuthVerdict, CredentialCache};
///
/// async fn check(cache: Arc<CredentialCache>) -> Result<(), dfs_common_authn::AuthError> {
///     let gate = AuthGate::new(cache);
///     let verdict = gate
///         .verify("app1", "1700000000", "b37039718d6a29c2b570bd4bc3ef8a7e")
///         .await?;
///     if verdict != AuthVerdict::Ok {
///         println!("rejected: {}", verdict.code());
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthGate {
    cache: Arc<CredentialCache>,
    digest: SignatureDigest,
    freshness_window: Duration,
}

impl AuthGate {
    /// Creates a gate with the default digest (MD5) and a two-hour window.
    pub fn new(cache: Arc<CredentialCache>) -> Self {
        Self {
            cache,
            digest: SignatureDigest::default(),
            freshness_window: DEFAULT_FRESHNESS_WINDOW,
        }
    }

    /// Creates a gate using the digest and freshness window from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidConfig`] if the config fails validation.
    pub fn from_config(
        cache: Arc<CredentialCache>,
        config: &AuthConfig,
    ) -> Result<Self, AuthError> {
        config.validate()?;
        Ok(Self::new(cache)
            .with_digest(config.digest)
            .with_freshness_window(config.freshness_window))
    }

    /// Sets the signature digest.
    #[must_use]
    pub fn with_digest(mut self, digest: SignatureDigest) -> Self {
        self.digest = digest;
        self
    }

    /// Sets the maximum accepted timestamp age.
    #[must_use]
    pub fn with_freshness_window(mut self, window: Duration) -> Self {
        self.freshness_window = window;
        self
    }

    /// The cache this gate reads through.
    #[must_use]
    pub fn cache(&self) -> &Arc<CredentialCache> {
        &self.cache
    }

    /// The configured digest.
    #[must_use]
    pub fn digest(&self) -> SignatureDigest {
        self.digest
    }

    /// The configured freshness window.
    #[must_use]
    pub fn freshness_window(&self) -> Duration {
        self.freshness_window
    }

    /// Verifies a request against the current wall clock.
    ///
    /// See [`verify_at`](Self::verify_at).
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::StoreUnavailable`] if the credential lookup
    /// could not reach the store.
    pub async fn verify(
        &self,
        app_key: &str,
        timestamp: &str,
        signature: &str,
    ) -> Result<AuthVerdict, AuthError> {
        self.verify_at(app_key, timestamp, signature, Utc::now()).await
    }

    /// Verifies a request as of `now`.
    ///
    /// Every expected failure is reported as a non-`Ok` verdict. Only
    /// infrastructure failures are errors.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::StoreUnavailable`] if the credential lookup
    /// could not reach the store.
    #[tracing::instrument(name = "verify", skip(self, signature, now))]
    pub async fn verify_at(
        &self,
        app_key: &str,
        timestamp: &str,
        signature: &str,
        now: DateTime<Utc>,
    ) -> Result<AuthVerdict, AuthError> {
        if app_key.is_empty() || timestamp.is_empty() || signature.is_empty() {
            return Ok(rejected(app_key, AuthVerdict::MalformedRequest));
        }

        let Some(record) = self.cache.get(app_key).await? else {
            return Ok(rejected(app_key, AuthVerdict::AppNotFound));
        };

        if !record.is_active() {
            return Ok(rejected(app_key, AuthVerdict::AppDisabled));
        }

        let expected = compute_signature(self.digest, app_key, record.secret(), timestamp);
        if !signatures_match(signature, &expected) {
            return Ok(rejected(app_key, AuthVerdict::SignatureMismatch));
        }

        let Some(issued_at) = parse_timestamp(timestamp) else {
            return Ok(rejected(app_key, AuthVerdict::MalformedRequest));
        };

        let freshness = check_freshness(issued_at, now, self.freshness_window);
        if !freshness.is_fresh() {
            tracing::warn!(
                app_key,
                verdict = AuthVerdict::TimestampInvalid.code(),
                freshness = freshness.as_str(),
                skew_ms = now.signed_duration_since(issued_at).num_milliseconds(),
                "authentication rejected"
            );
            return Ok(AuthVerdict::TimestampInvalid);
        }

        tracing::debug!(app_key, "request authenticated");
        Ok(AuthVerdict::Ok)
    }
}

fn rejected(app_key: &str, verdict: AuthVerdict) -> AuthVerdict {
    tracing::warn!(app_key, verdict = verdict.code(), "authentication rejected");
    verdict
}
