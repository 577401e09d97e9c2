//! Canonical timestamp normalization.
//!
//! Temporal fields reach the decoder in several shapes: the backend's own
//! timestamp wrapper, a plain string written by an older client, a native
//! date value, or nothing usable at all (including an unresolved server
//! timestamp placeholder from a pending write). [`normalize`] collapses all
//! of them into one ISO 8601 string so consumers can sort and compare
//! timestamps as plain strings.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Backend timestamp wrapper
// ---------------------------------------------------------------------------

/// The remote store's native timestamp representation.
///
/// Seconds since the Unix epoch plus a sub-second nanosecond component,
/// matching the layout the document backend uses on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BackendTimestamp {
    pub seconds: i64,
    pub nanos: u32,
}

impl BackendTimestamp {
    pub fn new(seconds: i64, nanos: u32) -> Self {
        Self { seconds, nanos }
    }

    /// Capture a wall-clock instant.
    pub fn from_date(date: Timestamp) -> Self {
        Self {
            seconds: date.timestamp(),
            nanos: date.timestamp_subsec_nanos(),
        }
    }

    /// The backend clock "now".
    pub fn now() -> Self {
        Self::from_date(Utc::now())
    }

    /// Convert to a UTC date. Returns `None` when the value is outside the
    /// representable range.
    pub fn to_date(&self) -> Option<Timestamp> {
        DateTime::from_timestamp(self.seconds, self.nanos)
    }
}

// ---------------------------------------------------------------------------
// Raw timestamp shapes
// ---------------------------------------------------------------------------

/// Every shape a temporal field can arrive in, decided at the decode
/// boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum RawTimestamp {
    /// The backend wrapper type.
    Wrapper(BackendTimestamp),
    /// A string, passed through verbatim.
    Text(String),
    /// A native date value.
    Native(Timestamp),
    /// Missing, null, a pending server placeholder, or any other shape.
    Unknown,
}

/// Format a date the canonical way: UTC, millisecond precision, `Z` suffix.
///
/// `2024-01-01T00:00:00Z` becomes `"2024-01-01T00:00:00.000Z"`.
pub fn to_canonical(date: Timestamp) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The current wall-clock time in canonical form.
pub fn now_canonical() -> String {
    to_canonical(Utc::now())
}

/// Normalize a raw timestamp into its canonical string.
///
/// Precedence: backend wrapper, then string (no validation), then native
/// date. Anything else silently falls back to the current wall-clock time.
pub fn normalize(value: &RawTimestamp) -> String {
    match value {
        RawTimestamp::Wrapper(ts) => match ts.to_date() {
            Some(date) => to_canonical(date),
            None => now_canonical(),
        },
        RawTimestamp::Text(s) => s.clone(),
        RawTimestamp::Native(date) => to_canonical(*date),
        RawTimestamp::Unknown => now_canonical(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn jan_first() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn wrapper_is_formatted_with_millis() {
        let raw = RawTimestamp::Wrapper(BackendTimestamp::from_date(jan_first()));
        assert_eq!(normalize(&raw), "2024-01-01T00:00:00.000Z");
    }

    #[test]
    fn sub_second_precision_is_truncated_to_millis() {
        let raw = RawTimestamp::Wrapper(BackendTimestamp::new(1_704_067_200, 123_456_789));
        assert_eq!(normalize(&raw), "2024-01-01T00:00:00.123Z");
    }

    #[test]
    fn string_passes_through_unchanged() {
        let iso = "2024-03-05T10:20:30.000Z".to_string();
        assert_eq!(normalize(&RawTimestamp::Text(iso.clone())), iso);

        // Not validated as a date.
        let junk = "last tuesday".to_string();
        assert_eq!(normalize(&RawTimestamp::Text(junk.clone())), junk);
    }

    #[test]
    fn normalizing_twice_is_idempotent() {
        let first = normalize(&RawTimestamp::Wrapper(BackendTimestamp::from_date(
            jan_first(),
        )));
        let second = normalize(&RawTimestamp::Text(first.clone()));
        assert_eq!(first, second);
    }

    #[test]
    fn native_date_is_formatted() {
        assert_eq!(
            normalize(&RawTimestamp::Native(jan_first())),
            "2024-01-01T00:00:00.000Z"
        );
    }

    #[test]
    fn unknown_falls_back_to_now() {
        let before = Utc::now() - chrono::Duration::milliseconds(1);
        let out = normalize(&RawTimestamp::Unknown);
        let parsed = DateTime::parse_from_rfc3339(&out)
            .expect("fallback must be parseable")
            .with_timezone(&Utc);
        assert!(parsed >= before, "fallback {out} is earlier than the call");
    }

    #[test]
    fn out_of_range_wrapper_falls_back_to_now() {
        let raw = RawTimestamp::Wrapper(BackendTimestamp::new(i64::MAX, 0));
        assert!(DateTime::parse_from_rfc3339(&normalize(&raw)).is_ok());
    }
}
