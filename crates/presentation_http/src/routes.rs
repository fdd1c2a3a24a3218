//! Route definitions

use axum::{
    Router,
    routing::{get, post},
};

use crate::{handlers, state::AppState};

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            "/api/users/{user_id}/calendar/file-info",
            get(handlers::calendar::file_info),
        )
        .route(
            "/api/users/{user_id}/calendar/events",
            get(handlers::calendar::events),
        )
        .route(
            "/api/users/{user_id}/migration",
            post(handlers::migration::migrate_user),
        )
        .with_state(state)
}
