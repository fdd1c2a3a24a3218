//! Infrastructure layer - Adapters for external systems
//!
//! Implements ports defined in the application layer: JSON-file event
//! stores, the calendar HTTP API, change fan-out and reminder sinks. Also
//! owns configuration loading and logging setup for the binaries.

pub mod adapters;
pub mod config;
pub mod persistence;
pub mod telemetry;

pub use adapters::*;
pub use config::{
    AppConfig, ReminderAppConfig, RemoteAppConfig, ServerConfig, StorageConfig, SyncAppConfig,
};
pub use persistence::JsonEventStore;
pub use telemetry::{LogFormat, LoggingConfig, TelemetryError, init_logging};
