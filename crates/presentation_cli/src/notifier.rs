//! Terminal reminder sink

use application::{ApplicationError, ReminderNotifierPort};
use async_trait::async_trait;

/// Prints fired reminders to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutReminderNotifier;

#[async_trait]
impl ReminderNotifierPort for StdoutReminderNotifier {
    async fn notify(&self, title: &str, formatted_time: &str) -> Result<(), ApplicationError> {
        println!("⏰ {title} starts at {formatted_time}");
        Ok(())
    }
}
