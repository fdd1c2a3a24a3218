//! Drift-detecting synchronization of a local event cache
//!
//! The service probes the remote collection's modification time and only
//! reloads when it moved past the last loaded one. Every trigger (periodic
//! timer, visibility regained, manual) goes through
//! [`SyncService::perform_sync`], which admits a single pass at a time.

use std::{
    fmt,
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use arc_swap::ArcSwap;
use chrono::Utc;
use domain::{CacheChange, CalendarEvent, DomainError, SyncState, SyncStatus};
use parking_lot::Mutex;
use tracing::{debug, error, info, instrument, warn};

use super::periodic_task::PeriodicTask;
use crate::{
    error::ApplicationError,
    ports::{ChangeNotifierPort, RemoteCalendarPort},
};

/// Default interval between periodic checks (5 minutes)
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Default deadline for each remote call
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the sync service
#[derive(Debug, Clone)]
pub struct SyncServiceConfig {
    /// Period of the background timer and freshness window of `should_sync`
    pub interval: Duration,
    /// Deadline applied to the probe and to the reload
    pub request_timeout: Duration,
    /// Whether `init` starts the background timer
    pub auto_sync: bool,
}

impl Default for SyncServiceConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SYNC_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            auto_sync: true,
        }
    }
}

/// What a single `perform_sync` call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Another pass was in flight; this trigger was dropped
    AlreadyRunning,
    /// Remote copy has not changed since the last reload
    Unchanged,
    /// Cache was replaced with a fresh remote copy
    Reconciled { event_count: usize },
    /// Probe or reload failed; state was left as it was
    Failed,
    /// The service was shut down while the pass was in flight; its result
    /// was dropped
    Discarded,
}

/// Clears the in-flight flag on every exit path, including cancellation
struct SyncGuard<'a>(&'a AtomicBool);

impl<'a> SyncGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Keeps a local event cache reconciled with a remote store
pub struct SyncService {
    remote: Arc<dyn RemoteCalendarPort>,
    notifier: Arc<dyn ChangeNotifierPort>,
    cache: ArcSwap<Vec<CalendarEvent>>,
    state: Mutex<SyncState>,
    syncing: AtomicBool,
    /// Bumped by `shutdown`; passes started under an older value don't record
    generation: AtomicU64,
    interval: Mutex<Duration>,
    request_timeout: Duration,
    auto_sync: bool,
    timer: Mutex<Option<PeriodicTask>>,
}

impl fmt::Debug for SyncService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncService")
            .field("state", &*self.state.lock())
            .field("syncing", &self.syncing.load(Ordering::Relaxed))
            .field("interval", &*self.interval.lock())
            .field("cached_events", &self.cache.load().len())
            .finish_non_exhaustive()
    }
}

impl SyncService {
    pub fn new(
        remote: Arc<dyn RemoteCalendarPort>,
        notifier: Arc<dyn ChangeNotifierPort>,
        config: SyncServiceConfig,
    ) -> Self {
        Self {
            remote,
            notifier,
            cache: ArcSwap::from_pointee(Vec::new()),
            state: Mutex::new(SyncState::default()),
            syncing: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            interval: Mutex::new(config.interval),
            request_timeout: config.request_timeout,
            auto_sync: config.auto_sync,
            timer: Mutex::new(None),
        }
    }

    /// Current cache contents
    pub fn cached_events(&self) -> Arc<Vec<CalendarEvent>> {
        self.cache.load_full()
    }

    /// Snapshot of the drift-detection timestamps
    pub fn state(&self) -> SyncState {
        *self.state.lock()
    }

    /// Whether a pass is currently in flight
    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::Acquire)
    }

    pub fn interval(&self) -> Duration {
        *self.interval.lock()
    }

    /// Whether enough time passed since the last successful check
    pub fn should_sync(&self) -> bool {
        let window = chrono::Duration::from_std(self.interval()).unwrap_or(chrono::Duration::MAX);
        self.state.lock().should_sync(Utc::now(), window)
    }

    /// Run one synchronization pass.
    ///
    /// Never fails: errors are logged and leave the timestamps untouched so
    /// the next trigger retries from scratch.
    #[instrument(skip(self))]
    pub async fn perform_sync(&self) -> SyncOutcome {
        let Some(_guard) = SyncGuard::acquire(&self.syncing) else {
            debug!("Sync already in progress, dropping trigger");
            return SyncOutcome::AlreadyRunning;
        };

        match self.check_and_reconcile().await {
            Ok(outcome) => outcome,
            Err(e) => {
                if e.is_retryable() {
                    warn!(error = %e, "Sync failed, will retry on next trigger");
                } else {
                    error!(error = %e, "Sync failed");
                }
                SyncOutcome::Failed
            },
        }
    }

    async fn check_and_reconcile(&self) -> Result<SyncOutcome, ApplicationError> {
        let generation = self.generation.load(Ordering::Acquire);
        let remote_mod_time = self
            .with_timeout("file-info probe", self.remote.file_modified_at())
            .await?;

        {
            let mut state = self.state.lock();
            if self.generation.load(Ordering::Acquire) != generation {
                debug!("Service shut down during probe, discarding result");
                return Ok(SyncOutcome::Discarded);
            }
            if state.is_unchanged(remote_mod_time) {
                state.record_unchanged(Utc::now());
                debug!(remote_mod_time = %remote_mod_time, "Remote unchanged, skipping reload");
                return Ok(SyncOutcome::Unchanged);
            }
        }

        let events = self
            .with_timeout("event reload", self.remote.fetch_events(true))
            .await?;
        let event_count = events.len();

        // Checked under the state lock so `shutdown` cannot interleave
        let now = Utc::now();
        {
            let mut state = self.state.lock();
            if self.generation.load(Ordering::Acquire) != generation {
                debug!("Service shut down during reload, discarding result");
                return Ok(SyncOutcome::Discarded);
            }
            self.cache.store(Arc::new(events));
            state.record_reconciled(remote_mod_time, now);
        }
        self.notifier.publish(CacheChange::from_sync(now));

        info!(
            remote_mod_time = %remote_mod_time,
            event_count,
            "Local cache reconciled with remote"
        );
        Ok(SyncOutcome::Reconciled { event_count })
    }

    async fn with_timeout<T>(
        &self,
        what: &str,
        call: impl Future<Output = Result<T, ApplicationError>>,
    ) -> Result<T, ApplicationError> {
        tokio::time::timeout(self.request_timeout, call)
            .await
            .map_err(|_| {
                ApplicationError::Timeout(format!(
                    "{what} exceeded {}ms",
                    self.request_timeout.as_millis()
                ))
            })?
    }

    /// Manual trigger
    pub async fn trigger_sync(&self) -> SyncOutcome {
        info!("Manual sync triggered");
        self.perform_sync().await
    }

    /// Visibility trigger; skipped while the last check is still fresh
    pub async fn on_visibility_regained(&self) -> Option<SyncOutcome> {
        if self.should_sync() {
            Some(self.perform_sync().await)
        } else {
            debug!("Last sync still fresh, ignoring visibility trigger");
            None
        }
    }

    /// Run an initial pass, then start the periodic timer if auto-sync is on
    pub async fn init(self: &Arc<Self>) -> SyncOutcome {
        let outcome = self.perform_sync().await;
        if self.auto_sync {
            self.start_periodic_sync();
        }
        outcome
    }

    /// Start (or restart) the periodic timer
    pub fn start_periodic_sync(self: &Arc<Self>) {
        let period = self.interval();
        let weak = Arc::downgrade(self);
        let task = PeriodicTask::spawn("calendar-sync", period, move || {
            let weak = weak.clone();
            async move {
                if let Some(service) = weak.upgrade() {
                    service.perform_sync().await;
                }
            }
        });

        let previous = self.timer.lock().replace(task);
        if let Some(previous) = previous {
            previous.stop();
        }
        info!(interval_secs = period.as_secs(), "Periodic sync started");
    }

    /// Stop the periodic timer; a no-op when it is not running
    pub fn stop_periodic_sync(&self) {
        let task = self.timer.lock().take();
        if let Some(task) = task {
            task.stop();
            info!("Periodic sync stopped");
        }
    }

    /// Whether the periodic timer is running
    pub fn is_auto_sync_enabled(&self) -> bool {
        self.timer.lock().is_some()
    }

    /// Enable or disable the periodic timer
    pub fn set_auto_sync(self: &Arc<Self>, enabled: bool) {
        let running = self.is_auto_sync_enabled();
        if enabled && !running {
            self.start_periodic_sync();
        } else if !enabled && running {
            self.stop_periodic_sync();
        }
    }

    /// Change the interval; restarts a running timer and keeps the timestamps
    pub fn set_sync_interval(self: &Arc<Self>, minutes: u32) -> Result<(), ApplicationError> {
        if minutes == 0 {
            return Err(DomainError::invalid_input("sync interval must be at least 1 minute").into());
        }
        *self.interval.lock() = Duration::from_secs(u64::from(minutes) * 60);
        if self.is_auto_sync_enabled() {
            self.start_periodic_sync();
        }
        info!(interval_minutes = minutes, "Sync interval updated");
        Ok(())
    }

    /// Stop the timer and forget all observed timestamps.
    ///
    /// A pass still in flight finishes as [`SyncOutcome::Discarded`] and
    /// records nothing.
    pub fn shutdown(&self) {
        self.stop_periodic_sync();
        let mut state = self.state.lock();
        self.generation.fetch_add(1, Ordering::AcqRel);
        state.reset();
        drop(state);
        info!("Sync service shut down");
    }

    pub fn status(&self) -> SyncStatus {
        let state = self.state();
        SyncStatus {
            is_syncing: self.is_syncing(),
            last_sync_time: state.last_sync_time,
            last_file_mod_time: state.last_file_mod_time,
            auto_sync_enabled: self.is_auto_sync_enabled(),
            interval_minutes: u32::try_from(self.interval().as_secs() / 60).unwrap_or(u32::MAX),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone};

    use super::*;
    use crate::ports::{MockChangeNotifierPort, MockRemoteCalendarPort};

    fn ts(min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 1, 12, min, 0).unwrap()
    }

    fn events(n: usize) -> Vec<CalendarEvent> {
        (0..n)
            .map(|i| CalendarEvent::new(i.to_string(), "event", ts(0), ts(1)))
            .collect()
    }

    /// Remote whose modification time and latency can be changed mid-test
    struct FakeRemote {
        mod_time: Mutex<DateTime<Utc>>,
        event_count: usize,
        delay: Duration,
        fail: AtomicBool,
        probes: AtomicUsize,
        fetches: AtomicUsize,
    }

    impl FakeRemote {
        fn new(mod_time: DateTime<Utc>, event_count: usize) -> Self {
            Self {
                mod_time: Mutex::new(mod_time),
                event_count,
                delay: Duration::ZERO,
                fail: AtomicBool::new(false),
                probes: AtomicUsize::new(0),
                fetches: AtomicUsize::new(0),
            }
        }

        fn slow(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl RemoteCalendarPort for FakeRemote {
        async fn file_modified_at(&self) -> Result<DateTime<Utc>, ApplicationError> {
            self.probes.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.fail.load(Ordering::SeqCst) {
                return Err(ApplicationError::Network("connection refused".into()));
            }
            Ok(*self.mod_time.lock())
        }

        async fn fetch_events(
            &self,
            force_reload: bool,
        ) -> Result<Vec<CalendarEvent>, ApplicationError> {
            assert!(force_reload);
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(events(self.event_count))
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        changes: Mutex<Vec<CacheChange>>,
    }

    impl ChangeNotifierPort for RecordingNotifier {
        fn publish(&self, change: CacheChange) {
            self.changes.lock().push(change);
        }
    }

    fn config(interval: Duration, request_timeout: Duration) -> SyncServiceConfig {
        SyncServiceConfig {
            interval,
            request_timeout,
            auto_sync: true,
        }
    }

    fn service(
        remote: &Arc<FakeRemote>,
        notifier: &Arc<RecordingNotifier>,
        cfg: SyncServiceConfig,
    ) -> Arc<SyncService> {
        Arc::new(SyncService::new(
            Arc::clone(remote) as Arc<dyn RemoteCalendarPort>,
            Arc::clone(notifier) as Arc<dyn ChangeNotifierPort>,
            cfg,
        ))
    }

    #[tokio::test]
    async fn first_sync_reconciles_and_notifies() {
        let remote = Arc::new(FakeRemote::new(ts(5), 3));
        let notifier = Arc::new(RecordingNotifier::default());
        let svc = service(&remote, &notifier, SyncServiceConfig::default());

        let outcome = svc.perform_sync().await;

        assert_eq!(outcome, SyncOutcome::Reconciled { event_count: 3 });
        assert_eq!(svc.cached_events().len(), 3);
        assert_eq!(svc.state().last_file_mod_time, Some(ts(5)));
        assert!(svc.state().last_sync_time.is_some());
        let changes = notifier.changes.lock();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].source, domain::ChangeSource::Sync);
    }

    #[tokio::test]
    async fn unchanged_remote_skips_reload_but_advances_sync_time() {
        let mut remote = MockRemoteCalendarPort::new();
        remote.expect_file_modified_at().times(2).returning(|| Ok(ts(5)));
        remote
            .expect_fetch_events()
            .times(1)
            .returning(|_| Ok(events(2)));
        let mut notifier = MockChangeNotifierPort::new();
        notifier.expect_publish().times(1).return_const(());

        let svc = SyncService::new(
            Arc::new(remote),
            Arc::new(notifier),
            SyncServiceConfig::default(),
        );

        svc.perform_sync().await;
        let cache_before = svc.cached_events();
        let first_sync = svc.state().last_sync_time.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert_eq!(svc.perform_sync().await, SyncOutcome::Unchanged);
        assert!(Arc::ptr_eq(&cache_before, &svc.cached_events()));
        assert!(svc.state().last_sync_time.unwrap() > first_sync);
        assert_eq!(svc.state().last_file_mod_time, Some(ts(5)));
    }

    #[tokio::test]
    async fn newer_remote_triggers_reload() {
        let remote = Arc::new(FakeRemote::new(ts(5), 1));
        let notifier = Arc::new(RecordingNotifier::default());
        let svc = service(&remote, &notifier, SyncServiceConfig::default());

        svc.perform_sync().await;
        *remote.mod_time.lock() = ts(9);
        assert_eq!(
            svc.perform_sync().await,
            SyncOutcome::Reconciled { event_count: 1 }
        );
        assert_eq!(remote.fetches.load(Ordering::SeqCst), 2);
        assert_eq!(svc.state().last_file_mod_time, Some(ts(9)));
        assert_eq!(notifier.changes.lock().len(), 2);
    }

    #[tokio::test]
    async fn failure_leaves_state_and_releases_guard() {
        let remote = Arc::new(FakeRemote::new(ts(5), 1));
        remote.fail.store(true, Ordering::SeqCst);
        let notifier = Arc::new(RecordingNotifier::default());
        let svc = service(&remote, &notifier, SyncServiceConfig::default());

        assert_eq!(svc.perform_sync().await, SyncOutcome::Failed);
        assert_eq!(svc.state(), SyncState::default());
        assert!(!svc.is_syncing());
        assert!(notifier.changes.lock().is_empty());

        remote.fail.store(false, Ordering::SeqCst);
        assert_eq!(
            svc.perform_sync().await,
            SyncOutcome::Reconciled { event_count: 1 }
        );
    }

    #[tokio::test]
    async fn concurrent_triggers_issue_one_reload() {
        let remote = Arc::new(FakeRemote::new(ts(5), 4).slow(Duration::from_millis(100)));
        let notifier = Arc::new(RecordingNotifier::default());
        let svc = service(&remote, &notifier, SyncServiceConfig::default());

        let (a, b) = tokio::join!(svc.perform_sync(), svc.perform_sync());

        let outcomes = [a, b];
        assert!(outcomes.contains(&SyncOutcome::AlreadyRunning));
        assert!(outcomes.contains(&SyncOutcome::Reconciled { event_count: 4 }));
        assert_eq!(remote.probes.load(Ordering::SeqCst), 1);
        assert_eq!(remote.fetches.load(Ordering::SeqCst), 1);
        assert!(!svc.is_syncing());
    }

    #[tokio::test]
    async fn hung_remote_times_out() {
        let remote = Arc::new(FakeRemote::new(ts(5), 1).slow(Duration::from_secs(30)));
        let notifier = Arc::new(RecordingNotifier::default());
        let svc = service(
            &remote,
            &notifier,
            config(DEFAULT_SYNC_INTERVAL, Duration::from_millis(30)),
        );

        assert_eq!(svc.perform_sync().await, SyncOutcome::Failed);
        assert!(!svc.is_syncing());
        assert_eq!(svc.state(), SyncState::default());
    }

    #[tokio::test]
    async fn cancelled_pass_releases_guard() {
        let remote = Arc::new(FakeRemote::new(ts(5), 1).slow(Duration::from_secs(30)));
        let notifier = Arc::new(RecordingNotifier::default());
        let svc = service(&remote, &notifier, SyncServiceConfig::default());

        let cancelled =
            tokio::time::timeout(Duration::from_millis(20), svc.perform_sync()).await;
        assert!(cancelled.is_err());
        assert!(!svc.is_syncing());
    }

    #[tokio::test]
    async fn visibility_trigger_respects_freshness() {
        let remote = Arc::new(FakeRemote::new(ts(5), 1));
        let notifier = Arc::new(RecordingNotifier::default());
        let svc = service(&remote, &notifier, SyncServiceConfig::default());

        assert!(svc.should_sync());
        assert!(svc.on_visibility_regained().await.is_some());
        assert!(!svc.should_sync());
        assert!(svc.on_visibility_regained().await.is_none());
        assert_eq!(remote.probes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn manual_trigger_ignores_freshness() {
        let remote = Arc::new(FakeRemote::new(ts(5), 1));
        let notifier = Arc::new(RecordingNotifier::default());
        let svc = service(&remote, &notifier, SyncServiceConfig::default());

        svc.trigger_sync().await;
        assert_eq!(svc.trigger_sync().await, SyncOutcome::Unchanged);
        assert_eq!(remote.probes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn init_syncs_then_ticks_periodically() {
        let remote = Arc::new(FakeRemote::new(ts(5), 1));
        let notifier = Arc::new(RecordingNotifier::default());
        let svc = service(
            &remote,
            &notifier,
            config(Duration::from_millis(30), DEFAULT_REQUEST_TIMEOUT),
        );

        assert_eq!(
            svc.init().await,
            SyncOutcome::Reconciled { event_count: 1 }
        );
        assert!(svc.is_auto_sync_enabled());
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(remote.probes.load(Ordering::SeqCst) >= 3);
        assert_eq!(remote.fetches.load(Ordering::SeqCst), 1);

        svc.shutdown();
        assert!(!svc.is_auto_sync_enabled());
        assert_eq!(svc.state(), SyncState::default());

        let probes = remote.probes.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(remote.probes.load(Ordering::SeqCst), probes);
    }

    #[tokio::test]
    async fn init_without_auto_sync_leaves_timer_off() {
        let remote = Arc::new(FakeRemote::new(ts(5), 1));
        let notifier = Arc::new(RecordingNotifier::default());
        let cfg = SyncServiceConfig {
            auto_sync: false,
            ..SyncServiceConfig::default()
        };
        let svc = service(&remote, &notifier, cfg);

        svc.init().await;
        assert!(!svc.is_auto_sync_enabled());
    }

    #[tokio::test]
    async fn start_and_stop_are_idempotent() {
        let remote = Arc::new(FakeRemote::new(ts(5), 1));
        let notifier = Arc::new(RecordingNotifier::default());
        let svc = service(&remote, &notifier, SyncServiceConfig::default());

        svc.stop_periodic_sync();
        svc.start_periodic_sync();
        svc.start_periodic_sync();
        assert!(svc.is_auto_sync_enabled());
        svc.stop_periodic_sync();
        svc.stop_periodic_sync();
        assert!(!svc.is_auto_sync_enabled());
    }

    #[tokio::test]
    async fn set_auto_sync_toggles_timer() {
        let remote = Arc::new(FakeRemote::new(ts(5), 1));
        let notifier = Arc::new(RecordingNotifier::default());
        let svc = service(&remote, &notifier, SyncServiceConfig::default());

        svc.set_auto_sync(true);
        assert!(svc.status().auto_sync_enabled);
        svc.set_auto_sync(true);
        assert!(svc.status().auto_sync_enabled);
        svc.set_auto_sync(false);
        assert!(!svc.status().auto_sync_enabled);
    }

    #[tokio::test]
    async fn interval_change_keeps_timestamps() {
        let remote = Arc::new(FakeRemote::new(ts(5), 1));
        let notifier = Arc::new(RecordingNotifier::default());
        let svc = service(&remote, &notifier, SyncServiceConfig::default());

        svc.init().await;
        let before = svc.state();
        svc.set_sync_interval(15).unwrap();

        assert_eq!(svc.state(), before);
        assert_eq!(svc.interval(), Duration::from_secs(900));
        assert_eq!(svc.status().interval_minutes, 15);
        assert!(svc.is_auto_sync_enabled());
        assert!(svc.set_sync_interval(0).is_err());
        svc.shutdown();
    }

    #[tokio::test]
    async fn status_reflects_progress() {
        let remote = Arc::new(FakeRemote::new(ts(5), 1));
        let notifier = Arc::new(RecordingNotifier::default());
        let svc = service(&remote, &notifier, SyncServiceConfig::default());

        assert_eq!(svc.status().status_text(Utc::now()), "never synced");
        svc.perform_sync().await;
        assert_eq!(svc.status().status_text(Utc::now()), "synced just now");
    }

    #[tokio::test]
    async fn shutdown_discards_pass_in_flight() {
        let remote = Arc::new(FakeRemote::new(ts(5), 1).slow(Duration::from_millis(100)));
        let notifier = Arc::new(RecordingNotifier::default());
        let svc = service(&remote, &notifier, SyncServiceConfig::default());

        let pass = {
            let svc = Arc::clone(&svc);
            tokio::spawn(async move { svc.perform_sync().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        svc.shutdown();

        assert_eq!(pass.await.unwrap(), SyncOutcome::Discarded);
        assert_eq!(svc.state(), SyncState::default());
        assert!(svc.cached_events().is_empty());
        assert!(notifier.changes.lock().is_empty());
        assert!(!svc.is_syncing());

        assert_eq!(
            svc.perform_sync().await,
            SyncOutcome::Reconciled { event_count: 1 }
        );
    }
}
