//! Synchronization, remote endpoint and reminder configuration.

use std::time::Duration;

use application::{ReminderSchedulerConfig, SyncServiceConfig};
use chrono_tz::Tz;
use integration_calendar_api::CalendarApiConfig;
use serde::{Deserialize, Serialize};

use super::default_true;

/// Periodic cache synchronization settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncAppConfig {
    /// Minutes between periodic checks (default: 5)
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u32,

    /// Deadline for each remote call in seconds (default: 10)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Start the periodic timer on init (default: true)
    #[serde(default = "default_true")]
    pub auto_sync: bool,
}

const fn default_interval_minutes() -> u32 {
    5
}

const fn default_request_timeout() -> u64 {
    10
}

impl Default for SyncAppConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
            request_timeout_secs: default_request_timeout(),
            auto_sync: true,
        }
    }
}

impl SyncAppConfig {
    pub fn to_sync_service_config(&self) -> SyncServiceConfig {
        SyncServiceConfig {
            interval: Duration::from_secs(u64::from(self.interval_minutes) * 60),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            auto_sync: self.auto_sync,
        }
    }
}

/// Remote calendar server the sync loop talks to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteAppConfig {
    /// Base URL of the calendar server (default: http://127.0.0.1:3000)
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

impl Default for RemoteAppConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl RemoteAppConfig {
    /// Client config; the per-request timeout comes from the sync section
    pub fn to_client_config(&self, sync: &SyncAppConfig) -> CalendarApiConfig {
        CalendarApiConfig {
            base_url: self.base_url.clone(),
            timeout_secs: sync.request_timeout_secs,
        }
    }
}

/// Reminder scheduler settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderAppConfig {
    /// Seconds between reminder checks (default: 60)
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,

    /// IANA zone used to read start times and format reminders (default: UTC)
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

const fn default_tick_secs() -> u64 {
    60
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for ReminderAppConfig {
    fn default() -> Self {
        Self {
            tick_secs: default_tick_secs(),
            timezone: default_timezone(),
        }
    }
}

impl ReminderAppConfig {
    pub fn parse_timezone(&self) -> Result<Tz, String> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| format!("unknown timezone: {}", self.timezone))
    }

    pub fn to_scheduler_config(&self) -> Result<ReminderSchedulerConfig, String> {
        Ok(ReminderSchedulerConfig {
            tick_interval: Duration::from_secs(self.tick_secs),
            timezone: self.parse_timezone()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_defaults_convert() {
        let config = SyncAppConfig::default().to_sync_service_config();
        assert_eq!(config.interval, Duration::from_secs(300));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert!(config.auto_sync);
    }

    #[test]
    fn remote_client_uses_sync_timeout() {
        let sync = SyncAppConfig {
            request_timeout_secs: 3,
            ..SyncAppConfig::default()
        };
        let client = RemoteAppConfig::default().to_client_config(&sync);
        assert_eq!(client.base_url, "http://127.0.0.1:3000");
        assert_eq!(client.timeout_secs, 3);
    }

    #[test]
    fn reminder_timezone_is_validated() {
        let ok = ReminderAppConfig {
            timezone: "Europe/Berlin".into(),
            ..ReminderAppConfig::default()
        };
        assert_eq!(
            ok.to_scheduler_config().unwrap().timezone,
            chrono_tz::Europe::Berlin
        );

        let bad = ReminderAppConfig {
            timezone: "Mars/Olympus".into(),
            ..ReminderAppConfig::default()
        };
        assert!(bad.to_scheduler_config().is_err());
    }
}
