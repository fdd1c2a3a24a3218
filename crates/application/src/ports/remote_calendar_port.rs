//! Remote authoritative event store port

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::CalendarEvent;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for the remote copy a local cache is reconciled against.
///
/// An implementation is bound to a single user's store.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RemoteCalendarPort: Send + Sync {
    /// Probe the modification time of the remote collection
    async fn file_modified_at(&self) -> Result<DateTime<Utc>, ApplicationError>;

    /// Fetch the complete collection; `force_reload` bypasses server-side caches
    async fn fetch_events(&self, force_reload: bool) -> Result<Vec<CalendarEvent>, ApplicationError>;
}
