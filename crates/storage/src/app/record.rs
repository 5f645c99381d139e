//! Application credential record.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Whether an application may authenticate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppStatus {
    /// The application may sign requests.
    #[default]
    Active,
    /// The application has been stopped by an administrator.
    Disabled,
}

impl AppStatus {
    /// Returns `true` if the application may authenticate.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for AppStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Disabled => f.write_str("disabled"),
        }
    }
}

/// Credentials of one registered application (tenant).
///
/// Records are immutable once loaded: a changed row in the store replaces
/// the cached record wholesale on the next fetch.
///
/// # Secret Handling
///
/// `app_secret` never crosses the wire. It is only used to recompute request
/// signatures locally, is wrapped in [`Zeroizing`] so it is scrubbed when the
/// record is dropped, and is redacted from `Debug` output.
///
/// # Example
///
/// ```
/// use dfs_common_storage::app::{AppStatus, CredentialRecord};
///
/// let record = CredentialRecord::builder()
///     .app_key("app1")
///     .app_secret("s3cr3t".to_owned())
///     .build();
///
/// assert_eq!(record.status, AppStatus::Active);
/// assert!(!format!("{record:?}").contains("s3cr3t"));
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
#[serde(deny_unknown_fields)]
pub struct CredentialRecord {
    /// Unique application identifier, sent by clients in the `appKey` header.
    #[builder(into)]
    pub app_key: String,

    /// Pre-shared secret mixed into every request signature.
    #[builder(into)]
    pub app_secret: Zeroizing<String>,

    /// Administrative status.
    #[builder(default)]
    #[serde(default)]
    pub status: AppStatus,

    /// Human-readable application name. Opaque to authentication.
    #[builder(into)]
    #[serde(default)]
    pub name: Option<String>,

    /// When the application was registered. Opaque to authentication.
    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
}

impl CredentialRecord {
    /// Returns `true` if the application may authenticate.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Returns the shared secret.
    #[must_use]
    pub fn secret(&self) -> &str {
        self.app_secret.as_str()
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("app_key", &self.app_key)
            .field("app_secret", &"<redacted>")
            .field("status", &self.status)
            .field("name", &self.name)
            .field("created_at", &self.created_at)
            .finish()
    }
}
