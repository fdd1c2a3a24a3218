//! Domain entities - Objects with identity and lifecycle

mod cache_change;
pub mod calendar_event;
pub mod migration;
pub mod schedule_entry;
mod sync_state;

pub use cache_change::{CacheChange, ChangeSource};
pub use calendar_event::{CalendarEvent, decode_events, encode_events};
pub use migration::{MigrationDecision, MigrationOutcome, SkipReason};
pub use schedule_entry::{DEFAULT_REMINDER_OFFSET_MINUTES, ScheduleEntry, parse_reminder_offset};
pub use sync_state::{SyncState, SyncStatus};
