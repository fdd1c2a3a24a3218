//! Lenient point-in-time parsing for user input and stored records
//!
//! Accepts RFC 3339 timestamps, naive local date-times (`T` or space
//! separated, optional seconds) and bare dates. Bare dates resolve to
//! midnight of that day.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

use crate::errors::DomainError;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// A parsed time input before it is pinned to a timezone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeInput {
    /// Carries its own offset
    Instant(DateTime<FixedOffset>),
    /// Date and wall-clock time without an offset
    Local(NaiveDateTime),
    /// Calendar date only
    Date(NaiveDate),
}

impl TimeInput {
    /// Parse a textual time input
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(DomainError::invalid_input("time input is empty"));
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self::Instant(dt));
        }
        for fmt in NAIVE_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                return Ok(Self::Local(dt));
            }
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Self::Date)
            .map_err(|_| DomainError::invalid_input(format!("unrecognized time: {input}")))
    }

    /// Whether the input had no time-of-day component
    pub const fn is_date_only(&self) -> bool {
        matches!(self, Self::Date(_))
    }

    /// Pin the input to `tz` and convert to UTC.
    ///
    /// Returns `None` for local times that do not exist in `tz` (DST gaps).
    /// Ambiguous local times pick the earlier instant.
    pub fn resolve<Tz: TimeZone>(&self, tz: &Tz) -> Option<DateTime<Utc>> {
        let naive = match *self {
            Self::Instant(dt) => return Some(dt.with_timezone(&Utc)),
            Self::Local(naive) => naive,
            Self::Date(date) => date.and_time(NaiveTime::MIN),
        };
        tz.from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Parse a stored timestamp, treating offset-less values as UTC
pub fn parse_utc(input: &str) -> Result<DateTime<Utc>, DomainError> {
    TimeInput::parse(input)
        .map_err(|e| DomainError::parse(e.to_string()))?
        .resolve(&Utc)
        .ok_or_else(|| DomainError::parse(format!("time does not exist: {input}")))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTime {
    Text(String),
    EpochMillis(i64),
}

/// Serde adapter for record timestamps stored as text or epoch milliseconds
pub fn deserialize_flexible<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    match RawTime::deserialize(deserializer)? {
        RawTime::Text(s) => parse_utc(&s).map_err(serde::de::Error::custom),
        RawTime::EpochMillis(ms) => DateTime::from_timestamp_millis(ms)
            .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {ms}"))),
    }
}
