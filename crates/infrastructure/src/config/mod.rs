//! Application configuration
//!
//! Split into focused sub-modules:
//! - `storage`: on-disk layout of the event stores
//! - `sync`: sync loop, remote server and reminder scheduler
//! - `server`: HTTP server settings
//!
//! Values are layered: built-in defaults, then an optional `config.toml`,
//! then `TIDELOG_`-prefixed environment variables using `__` between
//! section and key (e.g. `TIDELOG_SYNC__INTERVAL_MINUTES=10`).

mod server;
mod storage;
mod sync;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use server::ServerConfig;
pub use storage::StorageConfig;
pub use sync::{ReminderAppConfig, RemoteAppConfig, SyncAppConfig};

use crate::telemetry::LoggingConfig;

/// Shared default for boolean `true` fields across config structs
pub(crate) const fn default_true() -> bool {
    true
}

/// Environment variable prefix
pub const ENV_PREFIX: &str = "TIDELOG";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub sync: SyncAppConfig,

    #[serde(default)]
    pub reminder: ReminderAppConfig,

    #[serde(default)]
    pub remote: RemoteAppConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from `config.toml` (if present) and the environment
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from the given file (extension optional, may be
    /// absent) and the environment
    pub fn load_from(file: impl AsRef<Path>) -> Result<Self, config::ConfigError> {
        let file = file.as_ref().to_string_lossy().into_owned();
        let builder = config::Config::builder()
            // Start with defaults
            .set_default("sync.interval_minutes", 5)?
            .set_default("reminder.timezone", "UTC")?
            // Load from file if exists
            .add_source(config::File::with_name(&file).required(false))
            // Override with environment variables (e.g., TIDELOG_SERVER__PORT)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the services cannot run with
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.sync.interval_minutes == 0 {
            return Err(config::ConfigError::Message(
                "sync.interval_minutes must be at least 1".into(),
            ));
        }
        if self.reminder.tick_secs == 0 {
            return Err(config::ConfigError::Message(
                "reminder.tick_secs must be at least 1".into(),
            ));
        }
        self.reminder
            .parse_timezone()
            .map(|_| ())
            .map_err(config::ConfigError::Message)
    }
}
