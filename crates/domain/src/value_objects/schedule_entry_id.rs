//! Schedule entry identifier

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unique schedule entry identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScheduleEntryId(Uuid);

impl ScheduleEntryId {
    /// Create a new random schedule entry ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a schedule entry ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for ScheduleEntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ScheduleEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_unique() {
        assert_ne!(ScheduleEntryId::new(), ScheduleEntryId::new());
    }

    #[test]
    fn id_round_trips_through_display() {
        let id = ScheduleEntryId::new();
        assert_eq!(ScheduleEntryId::parse(&id.to_string()).unwrap(), id);
    }
}
