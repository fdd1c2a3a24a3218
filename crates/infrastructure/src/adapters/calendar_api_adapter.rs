//! Remote calendar adapter - Implements RemoteCalendarPort using integration_calendar_api

use std::sync::Arc;

use application::{error::ApplicationError, ports::RemoteCalendarPort};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{CalendarEvent, UserId};
use integration_calendar_api::{
    CalendarApiClient, CalendarApiConfig, CalendarApiError, HttpCalendarApiClient,
};
use tracing::{debug, instrument};

/// Adapter binding the calendar HTTP API to a single user's store
pub struct HttpRemoteCalendarAdapter {
    client: Arc<dyn CalendarApiClient>,
    user_id: UserId,
}

impl std::fmt::Debug for HttpRemoteCalendarAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRemoteCalendarAdapter")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

impl HttpRemoteCalendarAdapter {
    /// Create an adapter over an existing client
    pub fn new(client: Arc<dyn CalendarApiClient>, user_id: UserId) -> Self {
        Self { client, user_id }
    }

    /// Create an adapter with its own HTTP client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to initialize.
    pub fn with_config(
        config: CalendarApiConfig,
        user_id: UserId,
    ) -> Result<Self, ApplicationError> {
        let client = HttpCalendarApiClient::new(config).map_err(Self::map_error)?;
        Ok(Self::new(Arc::new(client), user_id))
    }

    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    fn map_error(err: CalendarApiError) -> ApplicationError {
        match err {
            CalendarApiError::ConnectionFailed(e)
            | CalendarApiError::RequestFailed(e)
            | CalendarApiError::ServiceUnavailable(e) => ApplicationError::Network(e),
            CalendarApiError::Timeout(e) => ApplicationError::Timeout(e),
            CalendarApiError::NotFound(e) => ApplicationError::MissingData(e),
            CalendarApiError::ParseError(e) => ApplicationError::Parse(e),
        }
    }
}

#[async_trait]
impl RemoteCalendarPort for HttpRemoteCalendarAdapter {
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    async fn file_modified_at(&self) -> Result<DateTime<Utc>, ApplicationError> {
        let info = self
            .client
            .file_info(&self.user_id)
            .await
            .map_err(Self::map_error)?;

        let modified = info.last_modified.to_utc().ok_or_else(|| {
            ApplicationError::Parse(format!(
                "unrecognized lastModified value: {:?}",
                info.last_modified
            ))
        })?;
        debug!(%modified, "Remote modification time");
        Ok(modified)
    }

    #[instrument(skip(self), fields(user_id = %self.user_id))]
    async fn fetch_events(
        &self,
        force_reload: bool,
    ) -> Result<Vec<CalendarEvent>, ApplicationError> {
        self.client
            .fetch_events(&self.user_id, force_reload)
            .await
            .map_err(Self::map_error)
    }
}
