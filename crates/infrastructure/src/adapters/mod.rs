//! Infrastructure adapters
//!
//! Adapters connect application ports to concrete implementations.

mod broadcast_change_notifier;
mod calendar_api_adapter;
mod log_reminder_notifier;
mod store_remote_adapter;

pub use broadcast_change_notifier::BroadcastChangeNotifier;
pub use calendar_api_adapter::HttpRemoteCalendarAdapter;
pub use log_reminder_notifier::LogReminderNotifier;
pub use store_remote_adapter::StoreRemoteAdapter;
