//! Global-to-user migration decision law

use serde::{Deserialize, Serialize};

use super::calendar_event::CalendarEvent;

/// Why a migration was not performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// The global store is absent or holds no events
    NoGlobalData,
    /// A previous migration left back-references in the user store
    AlreadyMigrated,
    /// The user store holds at least 10% of the global event count
    SufficientLocalData,
}

impl SkipReason {
    /// Stable machine-readable code
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NoGlobalData => "no-global-data",
            Self::AlreadyMigrated => "already-migrated",
            Self::SufficientLocalData => "sufficient-local-data",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Result of evaluating whether a user store should receive the global events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "decision", content = "reason", rename_all = "snake_case")]
pub enum MigrationDecision {
    Migrate,
    Skip(SkipReason),
}

impl MigrationDecision {
    /// Evaluate the decision law over the two store snapshots.
    ///
    /// An absent user store counts as empty. The back-reference check runs
    /// before the size check and wins regardless of counts. The user store
    /// qualifies when it holds strictly fewer than a tenth of the global
    /// event count, compared in integers as `user * 10 < global`.
    pub fn evaluate(global: Option<&[CalendarEvent]>, user: Option<&[CalendarEvent]>) -> Self {
        let global = match global {
            Some(events) if !events.is_empty() => events,
            _ => return Self::Skip(SkipReason::NoGlobalData),
        };
        let user = user.unwrap_or_default();
        if user.iter().any(CalendarEvent::is_migrated) {
            return Self::Skip(SkipReason::AlreadyMigrated);
        }
        if below_threshold(user.len(), global.len()) {
            Self::Migrate
        } else {
            Self::Skip(SkipReason::SufficientLocalData)
        }
    }

    pub const fn is_migrate(&self) -> bool {
        matches!(self, Self::Migrate)
    }
}

/// `user_count < 0.1 * global_count` without floating point rounding
pub fn below_threshold(user_count: usize, global_count: usize) -> bool {
    user_count.saturating_mul(10) < global_count
}

/// What an executed migration changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationOutcome {
    pub migrated_count: usize,
    pub total_user_events_after: usize,
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn events(n: usize, migrated: bool) -> Vec<CalendarEvent> {
        let t = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
        (0..n)
            .map(|i| {
                let e = CalendarEvent::new(i.to_string(), format!("e{i}"), t, t);
                if migrated { e.migrated_copy() } else { e }
            })
            .collect()
    }

    #[test]
    fn absent_or_empty_global_is_skipped() {
        assert_eq!(
            MigrationDecision::evaluate(None, None),
            MigrationDecision::Skip(SkipReason::NoGlobalData)
        );
        assert_eq!(
            MigrationDecision::evaluate(Some(&[][..]), None),
            MigrationDecision::Skip(SkipReason::NoGlobalData)
        );
    }

    #[test]
    fn absent_user_store_migrates() {
        let g = events(100, false);
        assert!(MigrationDecision::evaluate(Some(g.as_slice()), None).is_migrate());
    }

    #[test]
    fn small_user_store_migrates() {
        let g = events(100, false);
        let u = events(5, false);
        assert!(MigrationDecision::evaluate(Some(g.as_slice()), Some(u.as_slice())).is_migrate());
    }

    #[test]
    fn sufficient_user_store_is_skipped() {
        let g = events(100, false);
        let u = events(20, false);
        assert_eq!(
            MigrationDecision::evaluate(Some(g.as_slice()), Some(u.as_slice())),
            MigrationDecision::Skip(SkipReason::SufficientLocalData)
        );
        let u = events(10, false);
        assert_eq!(
            MigrationDecision::evaluate(Some(g.as_slice()), Some(u.as_slice())),
            MigrationDecision::Skip(SkipReason::SufficientLocalData)
        );
    }

    #[test]
    fn back_reference_wins_over_counts() {
        let g = events(1000, false);
        let u = events(1, true);
        assert_eq!(
            MigrationDecision::evaluate(Some(g.as_slice()), Some(u.as_slice())),
            MigrationDecision::Skip(SkipReason::AlreadyMigrated)
        );
    }

    #[test]
    fn threshold_is_exact_at_boundaries() {
        assert!(below_threshold(0, 1));
        assert!(!below_threshold(1, 10));
        assert!(below_threshold(1, 11));
        assert!(!below_threshold(3, 30));
    }

    #[test]
    fn decision_serializes_with_reason_code() {
        let json = serde_json::to_value(MigrationDecision::Skip(SkipReason::AlreadyMigrated)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"decision": "skip", "reason": "already-migrated"})
        );
        let json = serde_json::to_value(MigrationDecision::Migrate).unwrap();
        assert_eq!(json, serde_json::json!({"decision": "migrate"}));
    }
}
