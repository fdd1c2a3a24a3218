//! tidelog HTTP presentation layer
//!
//! Serves the per-user calendar endpoints the sync loop probes and reloads,
//! plus a migration trigger.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
