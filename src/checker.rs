//! Periodic deadline checking.
//!
//! Every tick the checker looks for open tasks whose notify time has passed,
//! whose deadline is less than 30 minutes away, or whose deadline has passed,
//! and whose notification for that event has not been delivered yet. It sends
//! the notification and only then sets the task's flag, so a failed delivery
//! is retried on the next tick and a delivered one is never repeated.
//!
//! The background loop is owned by a [`CheckerService`], which starts it at
//! most once per process and stops it on shutdown.

use crate::alerts::{Alert, AlertFeed, AlertKind};
use crate::error::Result;
use crate::notifier::{Notification, Notifier};
use crate::tasks::{local_now, Task, TaskStore};
use chrono::NaiveDateTime;
use once_cell::sync::{Lazy, OnceCell};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Interval between ticks when the configuration does not say otherwise (seconds).
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 60;

/// How long a popup stays on screen when the configuration does not say otherwise.
pub const DEFAULT_NOTIFICATION_TIMEOUT_SECS: u64 = 10;

/// Whether a tick is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckerState {
    /// Waiting for the next tick.
    #[default]
    Idle,
    /// Querying the store and sending notifications.
    Checking,
}

/// A notification that could not be delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryFailure {
    /// Task the notification was for.
    pub task_id: i64,
    /// Which notification failed.
    pub kind: AlertKind,
    /// Why it failed.
    pub error: String,
}

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// Tasks whose notify-time reminder was delivered.
    pub reminded: Vec<i64>,
    /// Tasks whose deadline-approaching alert was delivered.
    pub approaching: Vec<i64>,
    /// Tasks whose overdue alert was delivered.
    pub overdue: Vec<i64>,
    /// Notifications that failed and stay pending.
    pub failures: Vec<DeliveryFailure>,
    /// The tick was skipped because another one was still running.
    pub skipped: bool,
}

impl TickReport {
    /// Whether the tick did nothing at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reminded.is_empty()
            && self.approaching.is_empty()
            && self.overdue.is_empty()
            && self.failures.is_empty()
    }
}

/// Finds due tasks and notifies about them.
pub struct DeadlineChecker {
    store: Arc<dyn TaskStore + Send + Sync>,
    notifier: Arc<dyn Notifier>,
    alerts: Arc<AlertFeed>,
    notification_timeout_secs: u64,
    state: Mutex<CheckerState>,
}

impl DeadlineChecker {
    /// Create a checker over a store, a notifier and the feed it reports into.
    pub fn new(
        store: Arc<dyn TaskStore + Send + Sync>,
        notifier: Arc<dyn Notifier>,
        alerts: Arc<AlertFeed>,
    ) -> Self {
        Self {
            store,
            notifier,
            alerts,
            notification_timeout_secs: DEFAULT_NOTIFICATION_TIMEOUT_SECS,
            state: Mutex::new(CheckerState::Idle),
        }
    }

    /// Set how long popups stay on screen.
    #[must_use]
    pub const fn with_notification_timeout(mut self, secs: u64) -> Self {
        self.notification_timeout_secs = secs;
        self
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> CheckerState {
        self.state.lock().map(|s| *s).unwrap_or_default()
    }

    /// Run one check at time `now`.
    ///
    /// Returns an empty, `skipped` report if another tick is running.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried or a delivered
    /// notification cannot be recorded.
    pub fn tick(&self, now: NaiveDateTime) -> Result<TickReport> {
        {
            let Ok(mut state) = self.state.lock() else {
                return Ok(TickReport { skipped: true, ..TickReport::default() });
            };
            if *state == CheckerState::Checking {
                debug!("previous deadline check still running, skipping tick");
                return Ok(TickReport { skipped: true, ..TickReport::default() });
            }
            *state = CheckerState::Checking;
        }

        let result = self.check(now);

        if let Ok(mut state) = self.state.lock() {
            *state = CheckerState::Idle;
        }
        result
    }

    fn check(&self, now: NaiveDateTime) -> Result<TickReport> {
        let mut report = TickReport::default();

        for task in self.store.due_reminders(now)? {
            let notification = self.reminder_for(&task);
            if self.deliver(&task, AlertKind::Reminder, &notification, now, &mut report) {
                self.store.mark_notified(task.id)?;
                report.reminded.push(task.id);
            }
        }

        for task in self.store.approaching_unalerted(now)? {
            let notification = self.approaching_for(&task);
            if self.deliver(&task, AlertKind::Approaching, &notification, now, &mut report) {
                self.store.mark_approach_notified(task.id)?;
                report.approaching.push(task.id);
            }
        }

        for task in self.store.overdue_unalerted(now)? {
            let notification = self.overdue_for(&task);
            if self.deliver(&task, AlertKind::Overdue, &notification, now, &mut report) {
                self.store.mark_deadline_notified(task.id)?;
                report.overdue.push(task.id);
            }
        }

        Ok(report)
    }

    /// Send one notification, recording the outcome. Returns whether it was delivered.
    fn deliver(
        &self,
        task: &Task,
        kind: AlertKind,
        notification: &Notification,
        now: NaiveDateTime,
        report: &mut TickReport,
    ) -> bool {
        match self.notifier.send(notification) {
            Ok(()) => {
                info!(task_id = task.id, kind = ?kind, "notification delivered");
                self.alerts.push(Alert {
                    at: now,
                    task_id: task.id,
                    kind,
                    message: notification.message.clone(),
                });
                true
            }
            Err(e) => {
                warn!(task_id = task.id, kind = ?kind, error = %e, "notification delivery failed");
                self.alerts.push(Alert {
                    at: now,
                    task_id: task.id,
                    kind: AlertKind::DeliveryFailed,
                    message: format!("Could not notify about '{}': {e}", task.title),
                });
                report.failures.push(DeliveryFailure { task_id: task.id, kind, error: e.to_string() });
                false
            }
        }
    }

    fn reminder_for(&self, task: &Task) -> Notification {
        Notification {
            title: "Task Notification".to_string(),
            message: format!("Task '{}' notification time reached!", task.title),
            timeout_secs: self.notification_timeout_secs,
        }
    }

    fn approaching_for(&self, task: &Task) -> Notification {
        Notification {
            title: "Task Deadline Approaching".to_string(),
            message: format!("Task '{}' deadline is approaching!", task.title),
            timeout_secs: self.notification_timeout_secs,
        }
    }

    fn overdue_for(&self, task: &Task) -> Notification {
        Notification {
            title: "Task Overdue!".to_string(),
            message: format!("Task '{}' is overdue!", task.title),
            timeout_secs: self.notification_timeout_secs,
        }
    }
}

/// A spawned checker loop.
#[derive(Debug)]
struct RunningChecker {
    shutdown: Arc<Notify>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

/// Owns the background checker loop.
///
/// `start` spawns the loop the first time it is called and does nothing
/// afterwards, so one service never runs two loops. `shutdown` stops the
/// loop and waits for it. A stopped service is not restarted.
#[derive(Debug, Default)]
pub struct CheckerService {
    running: OnceCell<RunningChecker>,
}

/// The process-wide service used by the server binary.
static GLOBAL_SERVICE: Lazy<CheckerService> = Lazy::new(CheckerService::new);

impl CheckerService {
    /// Create a service with no loop running.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide service.
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL_SERVICE
    }

    /// Whether a loop has been started.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.running.get().is_some()
    }

    /// Start the checker loop on the current tokio runtime.
    ///
    /// Returns `true` if this call started the loop, `false` if it was
    /// already started.
    pub fn start(&self, checker: Arc<DeadlineChecker>, interval: Duration) -> bool {
        let mut started = false;
        self.running.get_or_init(|| {
            started = true;
            let shutdown = Arc::new(Notify::new());
            let handle = spawn_loop(checker, interval, Arc::clone(&shutdown));
            RunningChecker { shutdown, handle: Mutex::new(Some(handle)) }
        });
        started
    }

    /// Stop the loop and wait for it to finish. Does nothing if it never started.
    pub async fn shutdown(&self) {
        let Some(running) = self.running.get() else {
            return;
        };
        running.shutdown.notify_one();

        let handle = running.handle.lock().ok().and_then(|mut h| h.take());
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(error = %e, "deadline checker task ended abnormally");
            }
        }
    }
}

fn spawn_loop(
    checker: Arc<DeadlineChecker>,
    interval: Duration,
    shutdown: Arc<Notify>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_secs = interval.as_secs_f64(), "deadline checker started");
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let checker = Arc::clone(&checker);
                    match tokio::task::spawn_blocking(move || checker.tick(local_now())).await {
                        Ok(Ok(report)) if !report.is_empty() => {
                            info!(
                                reminded = report.reminded.len(),
                                approaching = report.approaching.len(),
                                overdue = report.overdue.len(),
                                failed = report.failures.len(),
                                "deadline check finished"
                            );
                        }
                        Ok(Ok(_)) => {}
                        Ok(Err(e)) => error!(error = %e, "deadline check failed"),
                        Err(e) => error!(error = %e, "deadline check task panicked"),
                    }
                }
                () = shutdown.notified() => {
                    info!("deadline checker stopping");
                    break;
                }
            }
        }
    })
}
