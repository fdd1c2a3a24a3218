//! Reminder sink that writes to the log

use application::{error::ApplicationError, ports::ReminderNotifierPort};
use async_trait::async_trait;
use tracing::info;

/// Emits each fired reminder as an `info` event
///
/// Used when stdout is not a terminal, e.g. under a service manager.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReminderNotifier;

#[async_trait]
impl ReminderNotifierPort for LogReminderNotifier {
    async fn notify(&self, title: &str, formatted_time: &str) -> Result<(), ApplicationError> {
        info!(title, at = formatted_time, "Reminder: {title} starts at {formatted_time}");
        Ok(())
    }
}
