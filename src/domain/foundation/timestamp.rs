//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// RFC 3339 rendering with millisecond precision.
    pub fn to_iso_string(&self) -> String {
        self.0.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    }

    /// Full English weekday name, e.g. "Tuesday".
    pub fn weekday_name(&self) -> String {
        self.0.format("%A").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed() -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap())
    }

    #[test]
    fn iso_string_is_utc_with_millis() {
        assert_eq!(fixed().to_iso_string(), "2024-03-05T14:30:00.000Z");
    }

    #[test]
    fn weekday_name_is_spelled_out() {
        assert_eq!(fixed().weekday_name(), "Tuesday");
    }

    #[test]
    fn now_is_ordered() {
        let a = Timestamp::now();
        let b = Timestamp::now();
        assert!(a <= b);
    }
}
