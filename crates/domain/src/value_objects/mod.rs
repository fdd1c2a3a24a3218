//! Value Objects - Immutable, identity-less domain primitives

mod event_id;
pub mod event_time;
mod schedule_entry_id;
mod user_id;

pub use event_id::EventId;
pub use event_time::TimeInput;
pub use schedule_entry_id::ScheduleEntryId;
pub use user_id::UserId;
