//! Remote calendar store client
//!
//! HTTP client for `/api/users/{user_id}/calendar/*`.

use std::time::Duration;

use async_trait::async_trait;
use domain::{CalendarEvent, UserId, decode_events};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::models::FileInfo;

/// Calendar API client errors
#[derive(Debug, Error)]
pub enum CalendarApiError {
    /// Connection to the calendar server failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request did not complete within the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Server answered with a non-success status
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The user's calendar does not exist on the server
    #[error("Not found: {0}")]
    NotFound(String),

    /// Server-side failure
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl CalendarApiError {
    fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::ConnectionFailed(err.to_string())
        } else {
            Self::RequestFailed(err.to_string())
        }
    }
}

/// Calendar API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarApiConfig {
    /// Server base URL (default: <http://127.0.0.1:3000>)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds (default: 10)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

const fn default_timeout() -> u64 {
    10
}

impl Default for CalendarApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Client trait for the remote calendar store
#[async_trait]
pub trait CalendarApiClient: Send + Sync {
    /// Probe the modification time of a user's stored collection
    async fn file_info(&self, user_id: &UserId) -> Result<FileInfo, CalendarApiError>;

    /// Fetch a user's full event collection
    async fn fetch_events(
        &self,
        user_id: &UserId,
        force_reload: bool,
    ) -> Result<Vec<CalendarEvent>, CalendarApiError>;

    /// Check if the server answers its health endpoint
    async fn is_healthy(&self) -> bool;
}

/// reqwest-backed implementation
#[derive(Debug)]
pub struct HttpCalendarApiClient {
    client: Client,
    config: CalendarApiConfig,
}

impl HttpCalendarApiClient {
    /// Create a new client with the given configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: CalendarApiConfig) -> Result<Self, CalendarApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CalendarApiError::ConnectionFailed(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn calendar_url(&self, user_id: &UserId, resource: &str) -> String {
        format!(
            "{}/api/users/{}/calendar/{resource}",
            self.config.base_url.trim_end_matches('/'),
            user_id
        )
    }

    async fn get(&self, url: &str) -> Result<Response, CalendarApiError> {
        debug!(url = %url, "Calendar API request");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CalendarApiError::from_transport(&e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(CalendarApiError::NotFound(url.to_string()));
        }
        if status.is_server_error() {
            return Err(CalendarApiError::ServiceUnavailable(format!("HTTP {status}")));
        }
        if !status.is_success() {
            return Err(CalendarApiError::RequestFailed(format!("HTTP {status}")));
        }
        Ok(response)
    }
}

#[async_trait]
impl CalendarApiClient for HttpCalendarApiClient {
    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn file_info(&self, user_id: &UserId) -> Result<FileInfo, CalendarApiError> {
        let url = self.calendar_url(user_id, "file-info");
        self.get(&url)
            .await?
            .json()
            .await
            .map_err(|e| CalendarApiError::ParseError(e.to_string()))
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn fetch_events(
        &self,
        user_id: &UserId,
        force_reload: bool,
    ) -> Result<Vec<CalendarEvent>, CalendarApiError> {
        let url = format!(
            "{}?force_reload={force_reload}",
            self.calendar_url(user_id, "events")
        );
        let body = self
            .get(&url)
            .await?
            .bytes()
            .await
            .map_err(|e| CalendarApiError::from_transport(&e))?;

        let events =
            decode_events(&body).map_err(|e| CalendarApiError::ParseError(e.to_string()))?;
        debug!(count = events.len(), "Fetched remote events");
        Ok(events)
    }

    async fn is_healthy(&self) -> bool {
        let url = format!("{}/health", self.config.base_url.trim_end_matches('/'));
        self.get(&url).await.is_ok()
    }
}
