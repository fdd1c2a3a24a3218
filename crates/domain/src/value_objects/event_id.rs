//! Event identifier as found in persisted event collections

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of a calendar event record.
///
/// Stores written by older clients use numeric ids while newer ones use
/// strings; both decode into the same textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Create an event ID from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the underlying string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for EventId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEventId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
    Float(f64),
}

impl<'de> Deserialize<'de> for EventId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match RawEventId::deserialize(deserializer)? {
            RawEventId::Text(s) => Self(s),
            RawEventId::Signed(n) => Self(n.to_string()),
            RawEventId::Unsigned(n) => Self(n.to_string()),
            RawEventId::Float(n) => Self(n.to_string()),
        })
    }
}
