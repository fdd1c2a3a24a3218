//! Schedule entries driving at-most-once reminder notifications

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    errors::DomainError,
    value_objects::{ScheduleEntryId, TimeInput},
};

/// Reminder offset used when none (or an unusable one) is supplied
pub const DEFAULT_REMINDER_OFFSET_MINUTES: u32 = 30;

/// Default length of an entry when only a start time is given
pub const DEFAULT_ENTRY_DURATION_MINUTES: i64 = 60;

/// A time-bound entry with a single reminder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: ScheduleEntryId,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub all_day: bool,
    pub reminder_offset_minutes: u32,
    notified: bool,
}

impl ScheduleEntry {
    /// Build a validated entry from raw user input.
    ///
    /// `start_input` is interpreted in `tz` unless it carries an offset.
    /// A date without a time of day starts at midnight. `offset_input`
    /// falls back to [`DEFAULT_REMINDER_OFFSET_MINUTES`] when absent,
    /// non-numeric or negative.
    pub fn create<Tz: TimeZone>(
        title: &str,
        start_input: &str,
        offset_input: Option<&str>,
        tz: &Tz,
    ) -> Result<Self, DomainError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(DomainError::invalid_input("title is required"));
        }
        if start_input.trim().is_empty() {
            return Err(DomainError::invalid_input("start time is required"));
        }
        let start_time = TimeInput::parse(start_input)?.resolve(tz).ok_or_else(|| {
            DomainError::invalid_input(format!("start time does not exist: {start_input}"))
        })?;

        Ok(Self {
            id: ScheduleEntryId::new(),
            title: title.to_string(),
            start_time,
            end_time: start_time + Duration::minutes(DEFAULT_ENTRY_DURATION_MINUTES),
            all_day: false,
            reminder_offset_minutes: parse_reminder_offset(offset_input),
            notified: false,
        })
    }

    /// Whether the reminder has already fired
    pub const fn is_notified(&self) -> bool {
        self.notified
    }

    /// Record that the reminder fired.
    ///
    /// Returns `true` only for the first call; the flag is never reset.
    pub fn mark_notified(&mut self) -> bool {
        !std::mem::replace(&mut self.notified, true)
    }

    /// Point in time at which the reminder window opens
    pub fn reminder_time(&self) -> DateTime<Utc> {
        self.start_time - Duration::minutes(i64::from(self.reminder_offset_minutes))
    }

    /// Whether the entry's start has already passed
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.start_time < now
    }

    /// Whether a reminder should fire at `now`.
    ///
    /// Entries that became overdue before firing are never due.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.notified && !self.is_overdue(now) && self.reminder_time() <= now
    }
}

/// Interpret a reminder offset the way the scheduling form submits it.
///
/// Leading whitespace is skipped and the longest leading integer is used,
/// so `"15min"` yields 15. Anything without a leading integer, or a
/// negative value, falls back to the default.
pub fn parse_reminder_offset(input: Option<&str>) -> u32 {
    let Some(raw) = input else {
        return DEFAULT_REMINDER_OFFSET_MINUTES;
    };
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return DEFAULT_REMINDER_OFFSET_MINUTES;
    }
    let digits = &digits[..end];
    if negative && digits.bytes().any(|b| b != b'0') {
        return DEFAULT_REMINDER_OFFSET_MINUTES;
    }
    digits.parse().unwrap_or(u32::MAX)
}
