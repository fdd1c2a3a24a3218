//! Wiring of the services for a single user

use std::{future::Future, io::IsTerminal, sync::Arc, time::Duration};

use anyhow::Context;
use application::{
    ChangeNotifierPort, EventStorePort, MigrationReport, MigrationService, RemoteCalendarPort,
    ReminderNotifierPort, ReminderScheduler, SyncOutcome, SyncService,
};
use chrono::Utc;
use domain::UserId;
use infrastructure::{
    AppConfig, BroadcastChangeNotifier, HttpRemoteCalendarAdapter, JsonEventStore,
    LogReminderNotifier, StoreRemoteAdapter,
};
use tokio::{signal, sync::broadcast::error::RecvError};
use tracing::{error, info, warn};

use crate::notifier::StdoutReminderNotifier;

/// Where the sync loop reads the authoritative collection from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteSource {
    /// The local data directory
    Local,
    /// A tidelog server at the given base URL
    Server(String),
}

impl RemoteSource {
    pub fn from_flag(server: Option<String>) -> Self {
        server.map_or(Self::Local, Self::Server)
    }
}

pub fn event_store(config: &AppConfig) -> Arc<dyn EventStorePort> {
    Arc::new(JsonEventStore::new(config.storage.clone()))
}

fn remote_for(
    config: &AppConfig,
    store: &Arc<dyn EventStorePort>,
    user_id: &UserId,
    source: &RemoteSource,
) -> anyhow::Result<Arc<dyn RemoteCalendarPort>> {
    Ok(match source {
        RemoteSource::Local => {
            Arc::new(StoreRemoteAdapter::new(Arc::clone(store), user_id.clone()))
        },
        RemoteSource::Server(base_url) => {
            let mut client = config.remote.to_client_config(&config.sync);
            client.base_url.clone_from(base_url);
            Arc::new(HttpRemoteCalendarAdapter::with_config(client, user_id.clone())?)
        },
    })
}

pub async fn migrate(config: &AppConfig, user_id: &UserId) -> anyhow::Result<MigrationReport> {
    let service = MigrationService::new(event_store(config));
    let report = service
        .run(user_id)
        .await
        .with_context(|| format!("migration failed for {user_id}"))?;
    Ok(report)
}

/// Build a sync service with a broadcast change sink
fn sync_service(
    config: &AppConfig,
    remote: Arc<dyn RemoteCalendarPort>,
) -> (Arc<SyncService>, BroadcastChangeNotifier) {
    let changes = BroadcastChangeNotifier::default();
    let notifier: Arc<dyn ChangeNotifierPort> = Arc::new(changes.clone());
    let service = Arc::new(SyncService::new(
        remote,
        notifier,
        config.sync.to_sync_service_config(),
    ));
    (service, changes)
}

/// Run a single sync pass
pub async fn sync_once(
    config: &AppConfig,
    user_id: &UserId,
    source: &RemoteSource,
) -> anyhow::Result<(SyncOutcome, String)> {
    let store = event_store(config);
    let remote = remote_for(config, &store, user_id, source)?;
    let (service, _changes) = sync_service(config, remote);

    let outcome = service.trigger_sync().await;
    Ok((outcome, service.status().status_text(Utc::now())))
}

/// What a session did before it was asked to stop
#[derive(Debug)]
pub struct SessionSummary {
    /// `None` when the migration failed; the session carried on without it
    pub migration: Option<MigrationReport>,
    pub initial_sync: SyncOutcome,
}

/// Reminders go to stdout on a terminal and to the log otherwise
fn reminder_sink() -> Arc<dyn ReminderNotifierPort> {
    if std::io::stdout().is_terminal() {
        Arc::new(StdoutReminderNotifier)
    } else {
        Arc::new(LogReminderNotifier)
    }
}

/// Session bootstrap: migrate, then keep the cache reconciled and fire
/// reminders until interrupted
pub async fn run(
    config: &AppConfig,
    user_id: &UserId,
    source: &RemoteSource,
) -> anyhow::Result<()> {
    println!("tidelog running for {user_id}; press Ctrl+C to stop");
    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };
    run_until(config, user_id, source, reminder_sink(), shutdown).await?;
    Ok(())
}

/// Run a session until `shutdown` resolves
///
/// A failed migration is logged and does not stop the session: the sync
/// loop and the scheduler still start against whatever the user store holds.
pub async fn run_until(
    config: &AppConfig,
    user_id: &UserId,
    source: &RemoteSource,
    reminders: Arc<dyn ReminderNotifierPort>,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<SessionSummary> {
    let migration = match migrate(config, user_id).await {
        Ok(report) => {
            info!(user_id = %user_id, decision = ?report.decision, "Migration checked");
            Some(report)
        },
        Err(e) => {
            error!(
                user_id = %user_id,
                error = %format!("{e:#}"),
                "Migration failed, continuing session"
            );
            None
        },
    };

    let scheduler = Arc::new(ReminderScheduler::new(
        config
            .reminder
            .to_scheduler_config()
            .map_err(anyhow::Error::msg)?,
    ));
    let store = event_store(config);
    let remote = remote_for(config, &store, user_id, source)?;
    let (sync, changes) = sync_service(config, remote);

    let mut rx = changes.subscribe();
    let watcher = {
        let sync = Arc::clone(&sync);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(change) => info!(
                        at = %change.timestamp,
                        events = sync.cached_events().len(),
                        "Calendar cache refreshed"
                    ),
                    Err(RecvError::Lagged(skipped)) => warn!(skipped, "Missed cache changes"),
                    Err(RecvError::Closed) => break,
                }
            }
        })
    };

    let initial_sync = sync.init().await;
    info!(outcome = ?initial_sync, "Initial sync finished");

    scheduler.set_notifier(reminders);
    scheduler.start();

    shutdown.await;

    scheduler.stop();
    scheduler.clear_notifier();
    sync.shutdown();
    watcher.abort();
    info!("Session stopped");
    Ok(SessionSummary {
        migration,
        initial_sync,
    })
}

/// Schedule one entry and wait until its reminder fired or it started
pub async fn remind(
    config: &AppConfig,
    title: &str,
    start: &str,
    offset: Option<&str>,
) -> anyhow::Result<()> {
    let scheduler = Arc::new(ReminderScheduler::new(
        config
            .reminder
            .to_scheduler_config()
            .map_err(anyhow::Error::msg)?,
    ));
    scheduler.set_notifier(Arc::new(StdoutReminderNotifier));

    let entry = scheduler.create_entry(title, start, offset)?;
    println!(
        "Scheduled '{}' at {} (reminder {} min before)",
        entry.title,
        scheduler.format_time(entry.start_time),
        entry.reminder_offset_minutes
    );
    if entry.is_overdue(Utc::now()) {
        println!("Start time already passed; no reminder will fire");
        return Ok(());
    }

    scheduler.start();
    let mut poll = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = poll.tick() => {
                let done = scheduler
                    .entry(entry.id)
                    .is_none_or(|e| e.is_notified() || e.is_overdue(Utc::now()));
                if done {
                    break;
                }
            }
            _ = signal::ctrl_c() => break,
        }
    }
    scheduler.stop();
    Ok(())
}
