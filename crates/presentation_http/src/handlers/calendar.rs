//! Per-user calendar endpoints probed and reloaded by the sync loop

use axum::{
    Json,
    extract::{Path, Query, State},
};
use domain::CalendarEvent;
use integration_calendar_api::FileInfo;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::parse_user_id;
use crate::{error::ApiError, state::AppState};

/// Query of the events endpoint
#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    /// Accepted for clients that bypass caches; the file store is always read
    #[serde(default)]
    pub force_reload: bool,
}

/// `GET /api/users/{user_id}/calendar/file-info`
#[instrument(skip(state))]
pub async fn file_info(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<FileInfo>, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    let modified = state
        .store
        .user_events_modified_at(&user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no calendar for user {user_id}")))?;

    Ok(Json(FileInfo {
        last_modified: modified.into(),
        size: None,
    }))
}

/// `GET /api/users/{user_id}/calendar/events?force_reload=`
///
/// A user without a store yet has an empty collection.
#[instrument(skip(state))]
pub async fn events(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<Vec<CalendarEvent>>, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    let events = state
        .store
        .load_user_events(&user_id)
        .await?
        .unwrap_or_default();

    debug!(count = events.len(), force_reload = query.force_reload, "Serving events");
    Ok(Json(events))
}
