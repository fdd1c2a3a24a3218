//! Application services - Use case implementations

mod migration_service;
mod periodic_task;
mod reminder_scheduler;
mod sync_service;

pub use migration_service::{MigrationPass, MigrationReport, MigrationService};
pub use periodic_task::PeriodicTask;
pub use reminder_scheduler::{DEFAULT_TICK_INTERVAL, ReminderScheduler, ReminderSchedulerConfig};
pub use sync_service::{
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_SYNC_INTERVAL, SyncOutcome, SyncService, SyncServiceConfig,
};
