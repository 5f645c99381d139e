//! Authentication verdicts.

use std::fmt;

/// The single outcome of verifying one request.
///
/// Checks run in a fixed order and stop at the first failure, so the variant
/// also tells how far verification got:
///
/// ```text
/// MalformedRequest → AppNotFound → AppDisabled → SignatureMismatch → TimestampInvalid → Ok
/// ```
///
/// Every non-`Ok` verdict is a deterministic function of the request and the
/// stored credentials. None of them should be retried.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use]
pub enum AuthVerdict {
    /// Identity and freshness verified; the request may proceed.
    Ok,
    /// No application is registered under the claimed key.
    AppNotFound,
    /// The application exists but is not active.
    AppDisabled,
    /// The signature does not match the one computed from the stored secret.
    SignatureMismatch,
    /// The timestamp is in the future or older than the freshness window.
    TimestampInvalid,
    /// A required field is empty, or the timestamp cannot be parsed.
    MalformedRequest,
}

impl AuthVerdict {
    /// All verdicts, in evaluation order with `Ok` first.
    pub const ALL: [AuthVerdict; 6] = [
        AuthVerdict::Ok,
        AuthVerdict::MalformedRequest,
        AuthVerdict::AppNotFound,
        AuthVerdict::AppDisabled,
        AuthVerdict::SignatureMismatch,
        AuthVerdict::TimestampInvalid,
    ];

    /// Returns `true` for [`AuthVerdict::Ok`].
    #[must_use]
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Stable error code handed to the responder.
    ///
    /// These strings are part of the client-facing contract and match the
    /// codes existing clients already handle.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::AppNotFound => "APP_NOT_EXIST",
            Self::AppDisabled => "APP_STOPPED",
            Self::SignatureMismatch => "APP_AUTH_FAILURE",
            Self::TimestampInvalid => "TIMESTAMP_ERROR",
            Self::MalformedRequest => "AUTH_PARAM_ERROR",
        }
    }

    /// Short human-readable description, suitable for logs.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Ok => "authenticated",
            Self::AppNotFound => "application not found",
            Self::AppDisabled => "application disabled",
            Self::SignatureMismatch => "signature mismatch",
            Self::TimestampInvalid => "timestamp outside freshness window",
            Self::MalformedRequest => "missing or malformed authentication fields",
        }
    }
}

impl fmt::Display for AuthVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}
