//! Logging initialization
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and either a
//! human-readable or a JSON formatting layer.

mod logging;

pub use logging::{LogFormat, LoggingConfig, TelemetryError, init_logging};
