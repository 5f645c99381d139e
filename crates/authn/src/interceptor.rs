//! Request boundary helpers.
//!
//! The transport layer owns header parsing and response encoding. This
//! module gives it the two things it needs from authentication: where to
//! find the credentials in a request, and what to answer.
//!
//! ```text
//! headers ──► RequestCredentials ──► AuthGate::verify ──► Admission
//!    │ missing/empty                       │ store down        │
//!    └──────────► Reject(MalformedRequest) └─► Unavailable     └─► status + code
//! ```

use chrono::{DateTime, Utc};

use crate::{gate::AuthGate, verdict::AuthVerdict};

/// Header carrying the application key.
pub const HEADER_APP_KEY: &str = "appKey";
/// Header carrying the request timestamp.
pub const HEADER_TIMESTAMP: &str = "timestamp";
/// Header carrying the hex signature.
pub const HEADER_SIGN: &str = "sign";

/// Error code reported when the credential store is unreachable.
pub const UNAVAILABLE_CODE: &str = "SERVICE_UNAVAILABLE";

/// The three authentication fields of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestCredentials {
    /// Claimed application key.
    pub app_key: String,
    /// Timestamp exactly as sent.
    pub timestamp: String,
    /// Hex signature.
    pub signature: String,
}

impl RequestCredentials {
    /// Reads the credentials through `lookup`, which maps a header name to
    /// its value.
    ///
    /// Values are taken verbatim. Returns `None` if any header is absent or
    /// empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use dfs_common_authn::interceptor::RequestCredentials;
    ///
    /// let headers = HashMap::from([
    ///     ("appKey", "app1"),
    ///     ("timestamp", "1700000000"),
    ///     ("sign", "b37039718d6a29c2b570bd4bc3ef8a7e"),
    /// ]);
    /// let creds = RequestCredentials::from_headers(|name| headers.get(name).copied()).unwrap();
    /// assert_eq!(creds.app_key, "app1");
    /// ```
    pub fn from_headers<'a, F>(mut lookup: F) -> Option<Self>
    where
        F: FnMut(&str) -> Option<&'a str>,
    {
        let mut field =
            |name: &str| lookup(name).filter(|value| !value.is_empty()).map(str::to_owned);
        Some(Self {
            app_key: field(HEADER_APP_KEY)?,
            timestamp: field(HEADER_TIMESTAMP)?,
            signature: field(HEADER_SIGN)?,
        })
    }
}

/// What the transport should do with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Admission {
    /// Authenticated; let the request through.
    Allow {
        /// The verified application key.
        app_key: String,
    },
    /// Not authenticated; answer unauthorized with the verdict's code.
    Reject {
        /// Why the request was refused.
        verdict: AuthVerdict,
    },
    /// Authentication could not be decided; answer service unavailable.
    Unavailable,
}

impl Admission {
    /// Returns `true` for [`Admission::Allow`].
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow { .. })
    }

    /// HTTP status for the response: 200, 401, or 503.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Allow { .. } => 200,
            Self::Reject { .. } => 401,
            Self::Unavailable => 503,
        }
    }

    /// Error code for the response body, `None` when allowed.
    #[must_use]
    pub fn error_code(&self) -> Option<&'static str> {
        match self {
            Self::Allow { .. } => None,
            Self::Reject { verdict } => Some(verdict.code()),
            Self::Unavailable => Some(UNAVAILABLE_CODE),
        }
    }
}

/// Authenticates a request against the current wall clock.
///
/// Missing headers are rejected without calling the gate. Store failures
/// are logged at `error` and reported as [`Admission::Unavailable`].
pub async fn admit<'a, F>(gate: &AuthGate, lookup: F) -> Admission
where
    F: FnMut(&str) -> Option<&'a str>,
{
    admit_at(gate, lookup, Utc::now()).await
}

/// Authenticates a request as of `now`. See [`admit`].
pub async fn admit_at<'a, F>(gate: &AuthGate, lookup: F, now: DateTime<Utc>) -> Admission
where
    F: FnMut(&str) -> Option<&'a str>,
{
    let Some(creds) = RequestCredentials::from_headers(lookup) else {
        tracing::warn!(
            verdict = AuthVerdict::MalformedRequest.code(),
            "request missing authentication headers"
        );
        return Admission::Reject { verdict: AuthVerdict::MalformedRequest };
    };

    match gate.verify_at(&creds.app_key, &creds.timestamp, &creds.signature, now).await {
        Ok(AuthVerdict::Ok) => Admission::Allow { app_key: creds.app_key },
        Ok(verdict) => Admission::Reject { verdict },
        Err(err) => {
            tracing::error!(
                app_key = %creds.app_key,
                error = %err,
                transient = err.is_transient(),
                "authentication unavailable"
            );
            Admission::Unavailable
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use std::{collections::HashMap, sync::Arc};

    use dfs_common_storage::{
        CredentialStore,
        testutil::{InjectedFailure, ScriptedCredentialStore, active_record},
    };
    use rstest::rstest;

    use super::*;
    use crate::credential_cache::CredentialCache;

    const SIGN: &str = "b37039718d6a29c2b570bd4bc3ef8a7e";

    fn reference_now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_060, 0).unwrap()
    }

    fn headers(app_key: &str, timestamp: &str, sign: &str) -> HashMap<String, String> {
        HashMap::from([
            (HEADER_APP_KEY.to_owned(), app_key.to_owned()),
            (HEADER_TIMESTAMP.to_owned(), timestamp.to_owned()),
            (HEADER_SIGN.to_owned(), sign.to_owned()),
        ])
    }

    fn gate() -> (Arc<ScriptedCredentialStore>, AuthGate) {
        let store =
            Arc::new(ScriptedCredentialStore::with_records([active_record("app1", "s3cr3t")]));
        let cache =
            Arc::new(CredentialCache::new(Arc::clone(&store) as Arc<dyn CredentialStore>));
        (store, AuthGate::new(cache))
    }

    #[test]
    fn test_from_headers_reads_all_three() {
        let map = headers("app1", "1700000000", SIGN);

        let creds = RequestCredentials::from_headers(|name| map.get(name).map(String::as_str));

        assert_eq!(
            creds,
            Some(RequestCredentials {
                app_key: "app1".into(),
                timestamp: "1700000000".into(),
                signature: SIGN.into(),
            })
        );
    }

    #[rstest]
    #[case::missing_key(HEADER_APP_KEY)]
    #[case::missing_timestamp(HEADER_TIMESTAMP)]
    #[case::missing_sign(HEADER_SIGN)]
    fn test_from_headers_missing(#[case] dropped: &str) {
        let mut map = headers("app1", "1700000000", SIGN);
        map.remove(dropped);

        let creds = RequestCredentials::from_headers(|name| map.get(name).map(String::as_str));

        assert!(creds.is_none());
    }

    #[test]
    fn test_from_headers_empty_value() {
        let map = headers("app1", "", SIGN);

        let creds = RequestCredentials::from_headers(|name| map.get(name).map(String::as_str));

        assert!(creds.is_none());
    }

    #[test]
    fn test_from_headers_does_not_trim() {
        let map = headers(" app1 ", "1700000000", SIGN);

        let creds =
            RequestCredentials::from_headers(|name| map.get(name).map(String::as_str)).unwrap();

        assert_eq!(creds.app_key, " app1 ");
    }

    #[tokio::test]
    async fn test_admit_allows_valid_request() {
        let (_, gate) = gate();
        let map = headers("app1", "1700000000", SIGN);

        let admission =
            admit_at(&gate, |name| map.get(name).map(String::as_str), reference_now()).await;

        assert_eq!(admission, Admission::Allow { app_key: "app1".into() });
        assert_eq!(admission.status_code(), 200);
        assert_eq!(admission.error_code(), None);
    }

    #[tokio::test]
    async fn test_admit_missing_headers_skips_gate() {
        let (store, gate) = gate();
        let map: HashMap<String, String> = HashMap::new();

        let admission = admit(&gate, |name| map.get(name).map(String::as_str)).await;

        assert_eq!(admission, Admission::Reject { verdict: AuthVerdict::MalformedRequest });
        assert_eq!(admission.status_code(), 401);
        assert_eq!(admission.error_code(), Some("AUTH_PARAM_ERROR"));
        assert_eq!(store.fetch_by_key_calls(), 0);
    }

    #[tokio::test]
    async fn test_admit_rejects_bad_signature() {
        let (_, gate) = gate();
        let map = headers("app1", "1700000000", "9e19f12795770b65e02c0fd8d2a4ba91");

        let admission =
            admit_at(&gate, |name| map.get(name).map(String::as_str), reference_now()).await;

        assert_eq!(admission.status_code(), 401);
        assert_eq!(admission.error_code(), Some("APP_AUTH_FAILURE"));
    }

    #[tokio::test]
    async fn test_admit_store_down_is_unavailable() {
        let (store, gate) = gate();
        store.fail_fetch_by_key(Some(InjectedFailure::Connection));
        let map = headers("app1", "1700000000", SIGN);

        let admission =
            admit_at(&gate, |name| map.get(name).map(String::as_str), reference_now()).await;

        assert_eq!(admission, Admission::Unavailable);
        assert_eq!(admission.status_code(), 503);
        assert_eq!(admission.error_code(), Some(UNAVAILABLE_CODE));
        assert!(!admission.is_allowed());
    }
}
