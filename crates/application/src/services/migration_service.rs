//! One-time migration of global events into per-user stores
//!
//! Migration is split into two steps. [`MigrationService::decide`] loads both
//! stores, evaluates the decision law and logs the verdict; nothing is
//! written. [`MigrationService::execute`] consumes the resulting
//! [`MigrationPass`] and commits the merged collection in a single write.
//! A pass holds the user's migration lock for its whole lifetime, so two
//! concurrent requests for the same user cannot both pass the idempotency
//! check.

use std::{collections::HashMap, fmt, sync::Arc};

use domain::{CalendarEvent, MigrationDecision, MigrationOutcome, UserId};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{error, info, instrument, warn};

use crate::{error::ApplicationError, ports::EventStorePort};

type LockMap = Arc<Mutex<HashMap<UserId, Arc<AsyncMutex<()>>>>>;

/// A held per-user migration lock.
///
/// On release the user's entry is removed from the lock map unless another
/// request already waits on it, so the map only holds users in flight.
struct UserLockGuard {
    user_id: UserId,
    locks: LockMap,
    _guard: OwnedMutexGuard<()>,
}

impl Drop for UserLockGuard {
    fn drop(&mut self) {
        let mut locks = self.locks.lock();
        // One reference in the map, one inside our guard
        let idle = locks
            .get(&self.user_id)
            .is_some_and(|lock| Arc::strong_count(lock) <= 2);
        if idle {
            locks.remove(&self.user_id);
        }
    }
}

/// A decision together with the snapshots it was made on.
///
/// Only obtainable from [`MigrationService::decide`]; the user's migration
/// lock is released when the pass is dropped or executed.
pub struct MigrationPass {
    user_id: UserId,
    decision: MigrationDecision,
    global: Vec<CalendarEvent>,
    user: Vec<CalendarEvent>,
    _lock: UserLockGuard,
}

impl MigrationPass {
    pub const fn decision(&self) -> MigrationDecision {
        self.decision
    }

    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn global_count(&self) -> usize {
        self.global.len()
    }

    pub fn user_count(&self) -> usize {
        self.user.len()
    }
}

impl fmt::Debug for MigrationPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationPass")
            .field("user_id", &self.user_id)
            .field("decision", &self.decision)
            .field("global_count", &self.global.len())
            .field("user_count", &self.user.len())
            .finish_non_exhaustive()
    }
}

/// Result of a full decide-then-execute run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub user_id: UserId,
    #[serde(flatten)]
    pub decision: MigrationDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<MigrationOutcome>,
}

/// Migrates global events into user stores at most once per user
pub struct MigrationService {
    store: Arc<dyn EventStorePort>,
    locks: LockMap,
}

impl fmt::Debug for MigrationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationService")
            .field("users_in_flight", &self.users_in_flight())
            .finish_non_exhaustive()
    }
}

impl MigrationService {
    pub fn new(store: Arc<dyn EventStorePort>) -> Self {
        Self {
            store,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn lock_user(&self, user_id: &UserId) -> UserLockGuard {
        let lock = Arc::clone(self.locks.lock().entry(user_id.clone()).or_default());
        UserLockGuard {
            user_id: user_id.clone(),
            locks: Arc::clone(&self.locks),
            _guard: lock.lock_owned().await,
        }
    }

    /// Number of users with a migration in flight or waiting
    pub fn users_in_flight(&self) -> usize {
        self.locks.lock().len()
    }

    /// Load both stores and evaluate whether `user_id` should be migrated.
    ///
    /// Read or parse failures abort with [`ApplicationError::MigrationFailed`].
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn decide(&self, user_id: &UserId) -> Result<MigrationPass, ApplicationError> {
        let lock = self.lock_user(user_id).await;

        let global = self.store.load_global_events().await.map_err(|e| {
            error!(user_id = %user_id, error = %e, "Failed to read global store");
            ApplicationError::migration_failed(user_id, e)
        })?;
        let user = self.store.load_user_events(user_id).await.map_err(|e| {
            error!(
                user_id = %user_id,
                global_count = global.as_ref().map_or(0, Vec::len),
                error = %e,
                "Failed to read user store"
            );
            ApplicationError::migration_failed(user_id, e)
        })?;

        let decision = MigrationDecision::evaluate(global.as_deref(), user.as_deref());
        let pass = MigrationPass {
            user_id: user_id.clone(),
            decision,
            global: global.unwrap_or_default(),
            user: user.unwrap_or_default(),
            _lock: lock,
        };

        info!(
            user_id = %user_id,
            global_count = pass.global_count(),
            user_count = pass.user_count(),
            decision = ?decision,
            "Migration decision"
        );
        Ok(pass)
    }

    /// Commit the migration evaluated by `pass`.
    ///
    /// Appends a back-referenced copy of every global event to the user's
    /// existing events and replaces the user store in one write. Fails with
    /// [`ApplicationError::InvalidOperation`] when the pass did not decide to
    /// migrate.
    #[instrument(skip(self, pass), fields(user_id = %pass.user_id))]
    pub async fn execute(&self, pass: MigrationPass) -> Result<MigrationOutcome, ApplicationError> {
        if !pass.decision.is_migrate() {
            warn!(decision = ?pass.decision, "Refusing to execute a skipped migration");
            return Err(ApplicationError::InvalidOperation(format!(
                "migration for {} was not decided: {:?}",
                pass.user_id, pass.decision
            )));
        }

        let MigrationPass {
            user_id,
            global,
            user,
            _lock,
            ..
        } = pass;
        let existing = user.len();
        let migrated_count = global.len();

        let mut merged = user;
        merged.reserve(migrated_count);
        merged.extend(global.iter().map(CalendarEvent::migrated_copy));

        self.store
            .replace_user_events(&user_id, &merged)
            .await
            .map_err(|e| {
                error!(
                    user_id = %user_id,
                    global_count = migrated_count,
                    user_count = existing,
                    error = %e,
                    "Failed to write migrated user store"
                );
                ApplicationError::migration_failed(&user_id, e)
            })?;

        let outcome = MigrationOutcome {
            migrated_count,
            total_user_events_after: merged.len(),
        };
        info!(
            user_id = %user_id,
            migrated_count,
            total_user_events_after = outcome.total_user_events_after,
            "Migration completed"
        );
        Ok(outcome)
    }

    /// Decide and, when warranted, execute in one step
    pub async fn run(&self, user_id: &UserId) -> Result<MigrationReport, ApplicationError> {
        let pass = self.decide(user_id).await?;
        let decision = pass.decision();
        let outcome = if decision.is_migrate() {
            Some(self.execute(pass).await?)
        } else {
            None
        };
        Ok(MigrationReport {
            user_id: user_id.clone(),
            decision,
            outcome,
        })
    }
}
