//! Drift-detection state for cache synchronization

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Timestamps tracked between synchronization passes.
///
/// `last_file_mod_time` is the remote modification time observed by the last
/// successful reload; `last_sync_time` advances on every successful check,
/// whether or not a reload happened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    pub last_sync_time: Option<DateTime<Utc>>,
    pub last_file_mod_time: Option<DateTime<Utc>>,
}

impl SyncState {
    /// Whether enough time has passed since the last successful check
    pub fn should_sync(&self, now: DateTime<Utc>, interval: Duration) -> bool {
        self.last_sync_time
            .is_none_or(|last| now.signed_duration_since(last) >= interval)
    }

    /// Whether the remote copy has not moved past what was last loaded
    pub fn is_unchanged(&self, remote_mod_time: DateTime<Utc>) -> bool {
        self.last_file_mod_time
            .is_some_and(|seen| remote_mod_time <= seen)
    }

    /// A check found no drift
    pub fn record_unchanged(&mut self, now: DateTime<Utc>) {
        self.last_sync_time = Some(now);
    }

    /// A reload replaced the cache with the remote copy at `remote_mod_time`
    pub fn record_reconciled(&mut self, remote_mod_time: DateTime<Utc>, now: DateTime<Utc>) {
        self.last_file_mod_time = Some(remote_mod_time);
        self.last_sync_time = Some(now);
    }

    /// Forget everything observed so far
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Point-in-time view of a synchronizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub is_syncing: bool,
    pub last_sync_time: Option<DateTime<Utc>>,
    pub last_file_mod_time: Option<DateTime<Utc>>,
    pub auto_sync_enabled: bool,
    pub interval_minutes: u32,
}

impl SyncStatus {
    /// Short human-readable description relative to `now`
    pub fn status_text(&self, now: DateTime<Utc>) -> String {
        if self.is_syncing {
            return "syncing…".to_string();
        }
        let Some(last) = self.last_sync_time else {
            return "never synced".to_string();
        };
        let elapsed = now.signed_duration_since(last);
        if elapsed < Duration::minutes(1) {
            "synced just now".to_string()
        } else if elapsed < Duration::hours(1) {
            format!("synced {} minutes ago", elapsed.num_minutes())
        } else if elapsed < Duration::days(1) {
            format!("synced {} hours ago", elapsed.num_hours())
        } else {
            format!("synced {} days ago", elapsed.num_days())
        }
    }
}
