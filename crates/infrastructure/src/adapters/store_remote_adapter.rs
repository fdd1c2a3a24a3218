//! Remote adapter reading a user's collection straight from an event store.
//!
//! Used when the sync loop runs on the same host as the store, so no HTTP hop
//! is needed.

use std::sync::Arc;

use application::{
    error::ApplicationError,
    ports::{EventStorePort, RemoteCalendarPort},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{CalendarEvent, UserId};

pub struct StoreRemoteAdapter {
    store: Arc<dyn EventStorePort>,
    user_id: UserId,
}

impl std::fmt::Debug for StoreRemoteAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreRemoteAdapter")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

impl StoreRemoteAdapter {
    pub fn new(store: Arc<dyn EventStorePort>, user_id: UserId) -> Self {
        Self { store, user_id }
    }
}

#[async_trait]
impl RemoteCalendarPort for StoreRemoteAdapter {
    async fn file_modified_at(&self) -> Result<DateTime<Utc>, ApplicationError> {
        self.store
            .user_events_modified_at(&self.user_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::MissingData(format!("no event store for user {}", self.user_id))
            })
    }

    async fn fetch_events(
        &self,
        _force_reload: bool,
    ) -> Result<Vec<CalendarEvent>, ApplicationError> {
        Ok(self
            .store
            .load_user_events(&self.user_id)
            .await?
            .unwrap_or_default())
    }
}
