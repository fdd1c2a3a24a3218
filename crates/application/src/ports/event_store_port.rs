//! Event store port
//!
//! Read/replace access to the global and per-user event collections.
//! Adapters in the infrastructure layer implement this port on top of JSON
//! files.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{CalendarEvent, UserId};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for event collection persistence
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EventStorePort: Send + Sync {
    /// Load the shared global collection; `None` when it does not exist
    async fn load_global_events(&self) -> Result<Option<Vec<CalendarEvent>>, ApplicationError>;

    /// Load a user's collection; `None` when the user has no store yet
    async fn load_user_events(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Vec<CalendarEvent>>, ApplicationError>;

    /// Replace a user's collection in a single all-or-nothing commit.
    ///
    /// Concurrent readers observe either the previous or the new collection,
    /// never a partial write.
    async fn replace_user_events(
        &self,
        user_id: &UserId,
        events: &[CalendarEvent],
    ) -> Result<(), ApplicationError>;

    /// Last modification time of a user's collection, if it exists
    async fn user_events_modified_at(
        &self,
        user_id: &UserId,
    ) -> Result<Option<DateTime<Utc>>, ApplicationError>;
}
