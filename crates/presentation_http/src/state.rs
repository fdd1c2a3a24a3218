//! Application state shared across handlers

use std::sync::Arc;

use application::{MigrationService, ports::EventStorePort};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global and per-user event collections
    pub store: Arc<dyn EventStorePort>,
    /// Global-to-user migration
    pub migration: Arc<MigrationService>,
}

impl AppState {
    pub fn new(store: Arc<dyn EventStorePort>) -> Self {
        let migration = Arc::new(MigrationService::new(Arc::clone(&store)));
        Self { store, migration }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
