//! Request timestamp parsing and freshness checks.
//!
//! Clients send the timestamp as an opaque header string. The gate hashes
//! that string verbatim and only parses it once the signature has matched.
//! Accepted forms, all read as UTC:
//!
//! | Form | Example |
//! |------|---------|
//! | Unix seconds (1–12 digits) | `1700000000` |
//! | Unix milliseconds (13+ digits) | `1700000000000` |
//! | RFC 3339 | `2023-11-14T22:13:20Z` |
//! | Date and time | `2023-11-14 22:13:20` |
//! | Compact date and time (14 digits) | `20231114221320` |
//!
//! A 14-digit string is read as a compact date and time when it forms a
//! valid calendar instant, and as milliseconds otherwise.

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};

/// Default freshness window (2 hours).
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_secs(2 * 60 * 60);

/// Longest all-digit string read as Unix seconds.
const MAX_SECONDS_DIGITS: usize = 12;

const COMPACT_DIGITS: usize = 14;
const COMPACT_FORMAT: &str = "%Y%m%d%H%M%S";
const SPACED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parses a request timestamp.
///
/// Returns `None` for empty input, unknown formats, and values outside the
/// representable range.
///
/// # Examples
///
/// ```
/// use dfs_common_authn::timestamp::parse_timestamp;
///
/// let secs = parse_timestamp("1700000000").unwrap();
/// let rfc = parse_timestamp("2023-11-14T22:13:20Z").unwrap();
/// assert_eq!(secs, rfc);
/// assert!(parse_timestamp("yesterday").is_none());
/// ```
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }

    if raw.bytes().all(|b| b.is_ascii_digit()) {
        return parse_numeric(raw);
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, SPACED_FORMAT).ok().map(|naive| naive.and_utc())
}

fn parse_numeric(digits: &str) -> Option<DateTime<Utc>> {
    if digits.len() <= MAX_SECONDS_DIGITS {
        let secs: i64 = digits.parse().ok()?;
        return DateTime::from_timestamp(secs, 0);
    }

    if digits.len() == COMPACT_DIGITS
        && let Ok(naive) = NaiveDateTime::parse_from_str(digits, COMPACT_FORMAT)
    {
        return Some(naive.and_utc());
    }

    let millis: i64 = digits.parse().ok()?;
    DateTime::from_timestamp_millis(millis)
}

/// Where a timestamp falls relative to the freshness window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Freshness {
    /// Not in the future and no older than the window.
    Fresh,
    /// Later than the verifier's clock.
    Future,
    /// Older than the window.
    Expired,
}

impl Freshness {
    /// Returns `true` for [`Freshness::Fresh`].
    #[must_use]
    pub fn is_fresh(self) -> bool {
        matches!(self, Self::Fresh)
    }

    /// Label used in log fields.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fresh => "fresh",
            Self::Future => "future",
            Self::Expired => "expired",
        }
    }
}

/// Classifies `issued_at` against `now` in whole seconds.
///
/// The age is truncated toward zero before comparing, so sub-second skew in
/// either direction is tolerated. A timestamp exactly `window` old is still
/// fresh; one whole second or more into the future is rejected.
#[must_use]
pub fn check_freshness(
    issued_at: DateTime<Utc>,
    now: DateTime<Utc>,
    window: Duration,
) -> Freshness {
    let delta_secs = now.signed_duration_since(issued_at).num_seconds();
    let window_secs = i64::try_from(window.as_secs()).unwrap_or(i64::MAX);

    if delta_secs < 0 {
        Freshness::Future
    } else if delta_secs > window_secs {
        Freshness::Expired
    } else {
        Freshness::Fresh
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use chrono::TimeZone;
    use rstest::rstest;

    use super::*;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap()
    }

    #[rstest]
    #[case::unix_seconds("1700000000")]
    #[case::unix_millis("1700000000000")]
    #[case::rfc3339_utc("2023-11-14T22:13:20Z")]
    #[case::rfc3339_offset("2023-11-15T06:13:20+08:00")]
    #[case::spaced("2023-11-14 22:13:20")]
    #[case::compact("20231114221320")]
    fn test_accepted_formats(#[case] raw: &str) {
        assert_eq!(parse_timestamp(raw), Some(reference()), "{raw}");
    }

    #[test]
    fn test_short_seconds() {
        assert_eq!(parse_timestamp("0"), DateTime::from_timestamp(0, 0));
        assert_eq!(parse_timestamp("86400"), DateTime::from_timestamp(86_400, 0));
    }

    #[test]
    fn test_millis_keep_fraction() {
        let parsed = parse_timestamp("1700000000123").unwrap();
        assert_eq!(parsed.timestamp_millis(), 1_700_000_000_123);
    }

    #[test]
    fn test_fourteen_digits_not_a_date_are_millis() {
        // Month 99 is not a calendar date.
        let parsed = parse_timestamp("20239914221320").unwrap();
        assert_eq!(parsed.timestamp_millis(), 20_239_914_221_320);
    }

    #[rstest]
    #[case::empty("")]
    #[case::word("yesterday")]
    #[case::negative("-1700000000")]
    #[case::decimal("1700000000.5")]
    #[case::padded(" 1700000000")]
    #[case::date_only("2023-11-14")]
    #[case::overflow("99999999999999999999999")]
    fn test_rejected(#[case] raw: &str) {
        assert_eq!(parse_timestamp(raw), None, "{raw:?}");
    }

    #[rstest]
    #[case::same_instant(0, Freshness::Fresh)]
    #[case::one_ms_old(1, Freshness::Fresh)]
    #[case::exactly_window(7_200_000, Freshness::Fresh)]
    #[case::half_second_past_window(7_200_500, Freshness::Fresh)]
    #[case::last_ms_of_window_second(7_200_999, Freshness::Fresh)]
    #[case::one_second_past_window(7_201_000, Freshness::Expired)]
    #[case::one_ms_ahead(-1, Freshness::Fresh)]
    #[case::seven_hundred_ms_ahead(-700, Freshness::Fresh)]
    #[case::one_second_ahead(-1_000, Freshness::Future)]
    fn test_freshness(#[case] age_ms: i64, #[case] expected: Freshness) {
        let now = reference();
        let issued_at = now - chrono::Duration::milliseconds(age_ms);

        assert_eq!(check_freshness(issued_at, now, DEFAULT_FRESHNESS_WINDOW), expected);
    }

    #[test]
    fn test_huge_window_never_expires() {
        let issued_at = DateTime::from_timestamp(0, 0).unwrap();
        let freshness = check_freshness(issued_at, reference(), Duration::MAX);
        assert!(freshness.is_fresh());
    }

    #[test]
    fn test_labels() {
        assert_eq!(Freshness::Fresh.as_str(), "fresh");
        assert_eq!(Freshness::Future.as_str(), "future");
        assert_eq!(Freshness::Expired.as_str(), "expired");
    }
}
