use std::fmt;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// UTC instant with microsecond precision.
///
/// The text form is always `YYYY-MM-DDTHH:MM:SS.ffffffZ`, so lexical order of
/// the rendered strings equals chronological order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// The current wall-clock instant.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Wrap a chrono instant, truncating to microseconds.
    pub fn from_datetime(instant: DateTime<Utc>) -> Self {
        Self(instant.trunc_subsecs(6))
    }

    /// Parse an RFC 3339 string. Offsets are normalized to UTC.
    pub fn parse(value: &str) -> Result<Self, TypeError> {
        let parsed = DateTime::parse_from_rfc3339(value).map_err(|e| {
            TypeError::InvalidTimestamp {
                value: value.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self::from_datetime(parsed.with_timezone(&Utc)))
    }

    /// The next representable instant (one microsecond later).
    pub fn next_tick(&self) -> Self {
        Self(self.0 + chrono::Duration::microseconds(1))
    }

    /// The underlying chrono value.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Render in the fixed `...ffffffZ` form.
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.to_rfc3339())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Timestamp::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(secs: i64, micros: u32) -> Timestamp {
        let base = Utc.timestamp_opt(secs, micros * 1_000).unwrap();
        Timestamp::from_datetime(base)
    }

    #[test]
    fn renders_fixed_width_utc() {
        let ts = at(1_698_402_600, 123_456);
        assert_eq!(ts.to_rfc3339(), "2023-10-27T10:30:00.123456Z");
    }

    #[test]
    fn whole_seconds_keep_micro_digits() {
        let ts = at(1_698_402_600, 0);
        assert_eq!(ts.to_string(), "2023-10-27T10:30:00.000000Z");
    }

    #[test]
    fn text_order_matches_time_order() {
        let earlier = at(1_698_402_600, 999_999);
        let later = at(1_698_402_601, 0);
        assert!(earlier < later);
        assert!(earlier.to_rfc3339() < later.to_rfc3339());
    }

    #[test]
    fn parse_normalizes_offsets() {
        let ts = Timestamp::parse("2023-10-27T12:30:00.5+02:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2023-10-27T10:30:00.500000Z");
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = Timestamp::parse("yesterday").unwrap_err();
        assert!(matches!(err, TypeError::InvalidTimestamp { .. }));
    }

    #[test]
    fn next_tick_is_strictly_later() {
        let ts = at(1_698_402_600, 999_999);
        let next = ts.next_tick();
        assert!(next > ts);
        assert_eq!(next.to_rfc3339(), "2023-10-27T10:30:01.000000Z");
    }

    #[test]
    fn now_truncates_to_micros() {
        let ts = Timestamp::now();
        assert_eq!(ts.as_datetime().timestamp_subsec_nanos() % 1_000, 0);
    }

    #[test]
    fn serde_roundtrip() {
        let ts = at(1_234_567_890, 42);
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"2009-02-13T23:31:30.000042Z\"");
        let parsed: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ts);
    }
}
