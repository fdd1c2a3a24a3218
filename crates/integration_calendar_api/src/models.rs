//! Wire models of the remote calendar endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response of the file-info probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub last_modified: LastModified,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// Modification time as sent by the server: ISO-8601 text or epoch millis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LastModified {
    EpochMillis(i64),
    Iso(String),
}

impl LastModified {
    /// Interpret the value as a UTC instant
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::EpochMillis(ms) => DateTime::from_timestamp_millis(*ms),
            Self::Iso(s) => domain::value_objects::event_time::parse_utc(s).ok(),
        }
    }
}

impl From<DateTime<Utc>> for LastModified {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::Iso(dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
    }
}
