//! Migration trigger

use application::MigrationReport;
use axum::{
    Json,
    extract::{Path, State},
};
use tracing::{info, instrument};

use super::parse_user_id;
use crate::{error::ApiError, state::AppState};

/// `POST /api/users/{user_id}/migration`
///
/// Runs the global-to-user migration for one user. Repeated calls are safe:
/// once migrated, the user is skipped.
#[instrument(skip(state))]
pub async fn migrate_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<MigrationReport>, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    let report = state.migration.run(&user_id).await?;
    info!(
        user_id = %report.user_id,
        migrated = report.outcome.map_or(0, |o| o.migrated_count),
        "Migration request handled"
    );
    Ok(Json(report))
}
