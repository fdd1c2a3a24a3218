//! At-most-once reminder scheduling over schedule entries

use std::{fmt, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use domain::{ScheduleEntry, ScheduleEntryId};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use super::periodic_task::PeriodicTask;
use crate::{error::ApplicationError, ports::ReminderNotifierPort};

/// Default tick interval (60 seconds)
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(60);

/// Configuration for the reminder scheduler
#[derive(Debug, Clone)]
pub struct ReminderSchedulerConfig {
    pub tick_interval: Duration,
    /// Zone used to read offset-less start inputs and to format reminder times
    pub timezone: Tz,
}

impl Default for ReminderSchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            timezone: Tz::UTC,
        }
    }
}

/// In-process collection of schedule entries with a periodic reminder tick
pub struct ReminderScheduler {
    entries: Mutex<Vec<ScheduleEntry>>,
    notifier: RwLock<Option<Arc<dyn ReminderNotifierPort>>>,
    tick_lock: tokio::sync::Mutex<()>,
    config: ReminderSchedulerConfig,
    task: Mutex<Option<PeriodicTask>>,
}

impl fmt::Debug for ReminderScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReminderScheduler")
            .field("entries", &self.entries.lock().len())
            .field("has_notifier", &self.notifier.read().is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ReminderScheduler {
    pub fn new(config: ReminderSchedulerConfig) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            notifier: RwLock::new(None),
            tick_lock: tokio::sync::Mutex::new(()),
            config,
            task: Mutex::new(None),
        }
    }

    /// Register the sink reminders are delivered to
    pub fn set_notifier(&self, notifier: Arc<dyn ReminderNotifierPort>) {
        *self.notifier.write() = Some(notifier);
    }

    /// Drop the sink; due reminders are skipped until a new one is set
    pub fn clear_notifier(&self) {
        *self.notifier.write() = None;
    }

    /// Validate input, store a new entry and return a copy of it
    pub fn create_entry(
        &self,
        title: &str,
        start_input: &str,
        reminder_offset: Option<&str>,
    ) -> Result<ScheduleEntry, ApplicationError> {
        let entry =
            ScheduleEntry::create(title, start_input, reminder_offset, &self.config.timezone)?;
        debug!(
            entry_id = %entry.id,
            start_time = %entry.start_time,
            reminder_offset_minutes = entry.reminder_offset_minutes,
            "Schedule entry created"
        );
        self.entries.lock().push(entry.clone());
        Ok(entry)
    }

    pub fn entries(&self) -> Vec<ScheduleEntry> {
        self.entries.lock().clone()
    }

    pub fn entry(&self, id: ScheduleEntryId) -> Option<ScheduleEntry> {
        self.entries.lock().iter().find(|e| e.id == id).cloned()
    }

    /// Render a start time as `HH:MM` in the configured zone
    pub fn format_time(&self, time: DateTime<Utc>) -> String {
        time.with_timezone(&self.config.timezone)
            .format("%H:%M")
            .to_string()
    }

    /// Fire reminders whose window is open at `now`.
    ///
    /// Entries are marked notified only after the sink accepted the
    /// reminder. Without a sink nothing is marked, so a later tick can still
    /// fire while the entry has not started yet. Returns the number fired.
    #[instrument(skip(self))]
    pub async fn check_for_notifications(&self, now: DateTime<Utc>) -> usize {
        let _tick = self.tick_lock.lock().await;

        let due: Vec<(ScheduleEntryId, String, DateTime<Utc>)> = self
            .entries
            .lock()
            .iter()
            .filter(|e| e.is_due(now))
            .map(|e| (e.id, e.title.clone(), e.start_time))
            .collect();
        if due.is_empty() {
            return 0;
        }

        let notifier = self.notifier.read().clone();
        let Some(notifier) = notifier else {
            warn!(due = due.len(), "No reminder sink registered, leaving entries pending");
            return 0;
        };

        let mut fired = 0;
        for (id, title, start_time) in due {
            let formatted = self.format_time(start_time);
            match notifier.notify(&title, &formatted).await {
                Ok(()) => {
                    let marked = self
                        .entries
                        .lock()
                        .iter_mut()
                        .find(|e| e.id == id)
                        .is_some_and(ScheduleEntry::mark_notified);
                    if marked {
                        fired += 1;
                        info!(entry_id = %id, title = %title, start = %formatted, "Reminder sent");
                    }
                },
                Err(e) => {
                    warn!(entry_id = %id, error = %e, "Reminder delivery failed");
                },
            }
        }
        fired
    }

    /// Start ticking; the first check runs immediately
    pub fn start(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let task = PeriodicTask::spawn_immediate(
            "reminder-scheduler",
            self.config.tick_interval,
            move || {
                let weak = weak.clone();
                async move {
                    if let Some(scheduler) = weak.upgrade() {
                        scheduler.check_for_notifications(Utc::now()).await;
                    }
                }
            },
        );
        let previous = self.task.lock().replace(task);
        if let Some(previous) = previous {
            previous.stop();
        }
        info!(
            tick_secs = self.config.tick_interval.as_secs(),
            timezone = %self.config.timezone,
            "Reminder scheduler started"
        );
    }

    /// Stop ticking; a no-op when not started
    pub fn stop(&self) {
        let task = self.task.lock().take();
        if let Some(task) = task {
            task.stop();
            info!("Reminder scheduler stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.lock().is_some()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration as ChronoDuration, TimeZone};

    use super::*;
    use crate::ports::MockReminderNotifierPort;

    fn scheduler() -> ReminderScheduler {
        ReminderScheduler::new(ReminderSchedulerConfig::default())
    }

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap()
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait::async_trait]
    impl ReminderNotifierPort for RecordingNotifier {
        async fn notify(&self, title: &str, formatted_time: &str) -> Result<(), ApplicationError> {
            self.sent
                .lock()
                .push((title.to_string(), formatted_time.to_string()));
            Ok(())
        }
    }

    #[test]
    fn create_entry_applies_defaults() {
        let s = scheduler();
        let entry = s.create_entry("Meeting", "2025-01-01", Some("10")).unwrap();
        assert_eq!(
            entry.start_time,
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            entry.end_time,
            Utc.with_ymd_and_hms(2025, 1, 1, 1, 0, 0).unwrap()
        );
        assert_eq!(entry.reminder_offset_minutes, 10);
        assert!(!entry.is_notified());
        assert_eq!(s.entries().len(), 1);
    }

    #[test]
    fn create_entry_rejects_bad_input() {
        let s = scheduler();
        let err = s.create_entry("", "2025-01-01", None).unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Domain(domain::DomainError::InvalidInput(_))
        ));
        assert!(s.entries().is_empty());
    }

    #[test]
    fn formats_in_configured_zone() {
        let s = ReminderScheduler::new(ReminderSchedulerConfig {
            timezone: chrono_tz::Europe::Berlin,
            ..ReminderSchedulerConfig::default()
        });
        let t = Utc.with_ymd_and_hms(2025, 1, 10, 7, 5, 0).unwrap();
        assert_eq!(s.format_time(t), "08:05");
    }

    #[tokio::test]
    async fn fires_exactly_once_across_repeated_ticks() {
        let s = scheduler();
        let notifier = Arc::new(RecordingNotifier::default());
        s.set_notifier(Arc::clone(&notifier) as Arc<dyn ReminderNotifierPort>);
        let start = base() + ChronoDuration::minutes(10);
        let entry = s
            .create_entry("Standup", &start.to_rfc3339(), Some("15"))
            .unwrap();

        let mut total = 0;
        for minute in 0..=10 {
            total += s
                .check_for_notifications(base() + ChronoDuration::minutes(minute))
                .await;
        }

        assert_eq!(total, 1);
        assert!(s.entry(entry.id).unwrap().is_notified());
        let sent = notifier.sent.lock();
        assert_eq!(sent.as_slice(), &[("Standup".to_string(), "09:10".to_string())]);
    }

    #[tokio::test]
    async fn waits_for_reminder_window() {
        let s = scheduler();
        let mut mock = MockReminderNotifierPort::new();
        mock.expect_notify().never();
        s.set_notifier(Arc::new(mock));
        let start = base() + ChronoDuration::hours(2);
        s.create_entry("Later", &start.to_rfc3339(), Some("30"))
            .unwrap();

        assert_eq!(s.check_for_notifications(base()).await, 0);
    }

    #[tokio::test]
    async fn overdue_entry_never_fires() {
        let s = scheduler();
        let mut mock = MockReminderNotifierPort::new();
        mock.expect_notify().never();
        s.set_notifier(Arc::new(mock));
        s.create_entry("Missed", &base().to_rfc3339(), Some("5"))
            .unwrap();

        let late = base() + ChronoDuration::minutes(1);
        assert_eq!(s.check_for_notifications(late).await, 0);
        assert!(!s.entries()[0].is_notified());
    }

    #[tokio::test]
    async fn missing_sink_leaves_entry_pending() {
        let s = scheduler();
        let start = base() + ChronoDuration::minutes(5);
        s.create_entry("Call", &start.to_rfc3339(), Some("10"))
            .unwrap();

        assert_eq!(s.check_for_notifications(base()).await, 0);
        assert!(!s.entries()[0].is_notified());

        let notifier = Arc::new(RecordingNotifier::default());
        s.set_notifier(Arc::clone(&notifier) as Arc<dyn ReminderNotifierPort>);
        assert_eq!(
            s.check_for_notifications(base() + ChronoDuration::minutes(1))
                .await,
            1
        );
        assert!(s.entries()[0].is_notified());
    }

    #[tokio::test]
    async fn cleared_sink_stops_delivery() {
        let s = scheduler();
        let notifier = Arc::new(RecordingNotifier::default());
        s.set_notifier(Arc::clone(&notifier) as Arc<dyn ReminderNotifierPort>);
        s.clear_notifier();
        let start = base() + ChronoDuration::minutes(5);
        s.create_entry("Call", &start.to_rfc3339(), Some("10"))
            .unwrap();

        assert_eq!(s.check_for_notifications(base()).await, 0);
        assert!(notifier.sent.lock().is_empty());
        assert!(!s.entries()[0].is_notified());
    }

    #[tokio::test]
    async fn sink_failure_does_not_mark_entry() {
        let s = scheduler();
        let mut mock = MockReminderNotifierPort::new();
        mock.expect_notify()
            .times(1)
            .returning(|_, _| Err(ApplicationError::Internal("sink offline".into())));
        s.set_notifier(Arc::new(mock));
        let start = base() + ChronoDuration::minutes(5);
        s.create_entry("Call", &start.to_rfc3339(), None).unwrap();

        assert_eq!(s.check_for_notifications(base()).await, 0);
        assert!(!s.entries()[0].is_notified());
    }

    #[tokio::test]
    async fn concurrent_ticks_fire_once() {
        let s = Arc::new(scheduler());
        let notifier = Arc::new(RecordingNotifier::default());
        s.set_notifier(Arc::clone(&notifier) as Arc<dyn ReminderNotifierPort>);
        let start = base() + ChronoDuration::minutes(5);
        s.create_entry("Sync", &start.to_rfc3339(), Some("10"))
            .unwrap();

        let (a, b) = tokio::join!(
            s.check_for_notifications(base()),
            s.check_for_notifications(base())
        );
        assert_eq!(a + b, 1);
        assert_eq!(notifier.sent.lock().len(), 1);
    }

    #[tokio::test]
    async fn start_and_stop() {
        let s = Arc::new(ReminderScheduler::new(ReminderSchedulerConfig {
            tick_interval: Duration::from_millis(20),
            ..ReminderSchedulerConfig::default()
        }));
        let notifier = Arc::new(RecordingNotifier::default());
        s.set_notifier(Arc::clone(&notifier) as Arc<dyn ReminderNotifierPort>);
        let start = Utc::now() + ChronoDuration::minutes(5);
        s.create_entry("Soon", &start.to_rfc3339(), Some("10"))
            .unwrap();

        s.start();
        assert!(s.is_running());
        tokio::time::sleep(Duration::from_millis(80)).await;
        s.stop();
        s.stop();
        assert!(!s.is_running());
        assert_eq!(notifier.sent.lock().len(), 1);
    }
}
