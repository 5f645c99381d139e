//! Authentication configuration.
//!
//! [`AuthConfig`] deserializes from any serde format, with durations in
//! humantime notation:
//!
//! ```toml
//! freshness_window = "2h"
//! digest = "md5"
//! store_timeout = "5s"
//! refresh_interval = "10m"
//! empty_reload = "clear"
//! ```
//!
//! Every field is optional. Call [`AuthConfig::validate`] before handing the
//! config to [`CredentialCache::from_config`](crate::CredentialCache::from_config)
//! or [`AuthGate::from_config`](crate::AuthGate::from_config); both call it too.

use std::time::Duration;

use dfs_common_storage::{ConfigError, DEFAULT_STORE_TIMEOUT};
use serde::{Deserialize, Serialize};

use crate::{
    credential_cache::EmptyReloadPolicy, signature::SignatureDigest,
    timestamp::DEFAULT_FRESHNESS_WINDOW,
};

/// Smallest accepted freshness window.
pub const MIN_FRESHNESS_WINDOW: Duration = Duration::from_secs(1);

/// Smallest accepted store deadline.
pub const MIN_STORE_TIMEOUT: Duration = Duration::from_millis(1);

/// Smallest accepted background refresh interval.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Settings for the credential cache and the verification gate.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use dfs_common_authn::{AuthConfig, SignatureDigest};
///
/// let config = AuthConfig::builder()
///     .digest(SignatureDigest::Sha256)
///     .freshness_window(Duration::from_secs(300))
///     .build();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Maximum age of an accepted request timestamp.
    #[serde(with = "humantime_serde", default = "default_freshness_window")]
    #[builder(default = DEFAULT_FRESHNESS_WINDOW)]
    pub freshness_window: Duration,

    /// Signature digest. Must match what clients sign with.
    #[serde(default)]
    #[builder(default)]
    pub digest: SignatureDigest,

    /// Deadline applied to every credential store call.
    #[serde(with = "humantime_serde", default = "default_store_timeout")]
    #[builder(default = DEFAULT_STORE_TIMEOUT)]
    pub store_timeout: Duration,

    /// Interval of the background bulk reload. `None` disables it.
    #[serde(with = "humantime_serde", default)]
    pub refresh_interval: Option<Duration>,

    /// What a reload does when the store reports no applications.
    #[serde(default)]
    #[builder(default)]
    pub empty_reload: EmptyReloadPolicy,
}

fn default_freshness_window() -> Duration {
    DEFAULT_FRESHNESS_WINDOW
}

fn default_store_timeout() -> Duration {
    DEFAULT_STORE_TIMEOUT
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl AuthConfig {
    /// Checks every duration against its lower bound.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BelowMinimum`] naming the first field that is
    /// too small.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_minimum("freshness_window", self.freshness_window, MIN_FRESHNESS_WINDOW)?;
        check_minimum("store_timeout", self.store_timeout, MIN_STORE_TIMEOUT)?;
        if let Some(interval) = self.refresh_interval {
            check_minimum("refresh_interval", interval, MIN_REFRESH_INTERVAL)?;
        }
        Ok(())
    }
}

fn check_minimum(field: &'static str, value: Duration, min: Duration) -> Result<(), ConfigError> {
    if value < min {
        return Err(ConfigError::BelowMinimum {
            field,
            min: format!("{min:?}"),
            value: format!("{value:?}"),
        });
    }
    Ok(())
}
