//! Reminder notification port

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Sink invoked when a schedule entry's reminder fires
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ReminderNotifierPort: Send + Sync {
    /// Deliver a reminder for `title` starting at `formatted_time`
    async fn notify(&self, title: &str, formatted_time: &str) -> Result<(), ApplicationError>;
}
