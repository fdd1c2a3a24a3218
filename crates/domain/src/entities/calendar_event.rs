//! Calendar event records as persisted in the global and per-user stores

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    errors::DomainError,
    value_objects::{EventId, event_time},
};

/// An event record.
///
/// Only the fields this crate reasons about are typed. Everything else a
/// record carries (description, location, completion flags, ...) is kept
/// verbatim in `extra` so a read-modify-write cycle never drops data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: EventId,
    pub title: String,
    #[serde(
        rename = "start_datetime",
        alias = "start",
        deserialize_with = "event_time::deserialize_flexible"
    )]
    pub start: DateTime<Utc>,
    #[serde(
        rename = "end_datetime",
        alias = "end",
        deserialize_with = "event_time::deserialize_flexible"
    )]
    pub end: DateTime<Utc>,
    /// Back-reference to the global event this record was copied from
    #[serde(
        default,
        alias = "migratedFromGlobal",
        skip_serializing_if = "Option::is_none"
    )]
    pub migrated_from_global: Option<EventId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CalendarEvent {
    /// Create an event with no extra fields
    pub fn new(
        id: impl Into<EventId>,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            start,
            end,
            migrated_from_global: None,
            extra: Map::new(),
        }
    }

    /// Whether this record was produced by a global-to-user migration
    pub const fn is_migrated(&self) -> bool {
        self.migrated_from_global.is_some()
    }

    /// Copy of this event stamped with a back-reference to its own id
    #[must_use]
    pub fn migrated_copy(&self) -> Self {
        Self {
            migrated_from_global: Some(self.id.clone()),
            ..self.clone()
        }
    }
}

/// Decode a persisted event collection.
///
/// The whole collection is rejected if any record is malformed.
pub fn decode_events(bytes: &[u8]) -> Result<Vec<CalendarEvent>, DomainError> {
    serde_json::from_slice(bytes).map_err(|e| DomainError::parse(format!("event collection: {e}")))
}

/// Encode an event collection in the on-disk format
pub fn encode_events(events: &[CalendarEvent]) -> Result<Vec<u8>, DomainError> {
    serde_json::to_vec_pretty(events).map_err(DomainError::from)
}
