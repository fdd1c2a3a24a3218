//! Notification emitted whenever a local event cache is replaced

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What caused the cache replacement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeSource {
    Sync,
}

/// Payload delivered to cache observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheChange {
    pub timestamp: DateTime<Utc>,
    pub source: ChangeSource,
}

impl CacheChange {
    pub const fn from_sync(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            source: ChangeSource::Sync,
        }
    }
}
