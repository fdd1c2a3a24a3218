//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! external systems. Adapters in the infrastructure layer implement these ports.

mod change_notifier_port;
mod event_store_port;
mod reminder_notifier_port;
mod remote_calendar_port;

#[cfg(test)]
pub use change_notifier_port::MockChangeNotifierPort;
pub use change_notifier_port::ChangeNotifierPort;
#[cfg(test)]
pub use event_store_port::MockEventStorePort;
pub use event_store_port::EventStorePort;
#[cfg(test)]
pub use reminder_notifier_port::MockReminderNotifierPort;
pub use reminder_notifier_port::ReminderNotifierPort;
#[cfg(test)]
pub use remote_calendar_port::MockRemoteCalendarPort;
pub use remote_calendar_port::RemoteCalendarPort;
