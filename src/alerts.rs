//! Recent checker activity shown on the page as transient messages.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Number of alerts kept when the configuration does not say otherwise.
pub const DEFAULT_ALERT_HISTORY: usize = 20;

/// What kind of event an alert records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// A notify-time reminder was delivered.
    Reminder,
    /// A deadline-approaching alert was delivered.
    Approaching,
    /// An overdue alert was delivered.
    Overdue,
    /// A notification could not be delivered and will be retried.
    DeliveryFailed,
}

/// One entry in the alert feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    /// When the checker produced the alert.
    pub at: NaiveDateTime,
    /// Task the alert is about.
    pub task_id: i64,
    /// Kind of event.
    pub kind: AlertKind,
    /// Text shown to the user.
    pub message: String,
}

/// Bounded, newest-first feed of alerts.
#[derive(Debug)]
pub struct AlertFeed {
    entries: Mutex<VecDeque<Alert>>,
    capacity: usize,
}

impl AlertFeed {
    /// Create a feed keeping at most `capacity` alerts.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { entries: Mutex::new(VecDeque::with_capacity(capacity)), capacity }
    }

    /// Add an alert, dropping the oldest one when full.
    pub fn push(&self, alert: Alert) {
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        entries.push_front(alert);
        entries.truncate(self.capacity);
    }

    /// The stored alerts, newest first.
    #[must_use]
    pub fn recent(&self) -> Vec<Alert> {
        self.entries.lock().map(|e| e.iter().cloned().collect()).unwrap_or_default()
    }
}

impl Default for AlertFeed {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_HISTORY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn alert(task_id: i64) -> Alert {
        Alert {
            at: NaiveDate::from_ymd_opt(2026, 1, 2).unwrap().and_hms_opt(3, 4, 5).unwrap(),
            task_id,
            kind: AlertKind::Reminder,
            message: format!("task {task_id}"),
        }
    }

    #[test]
    fn test_newest_first() {
        let feed = AlertFeed::new(5);
        feed.push(alert(1));
        feed.push(alert(2));
        let ids: Vec<i64> = feed.recent().iter().map(|a| a.task_id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_bounded() {
        let feed = AlertFeed::new(2);
        for id in 1..=4 {
            feed.push(alert(id));
        }
        let ids: Vec<i64> = feed.recent().iter().map(|a| a.task_id).collect();
        assert_eq!(ids, vec![4, 3]);
    }

    #[test]
    fn test_zero_capacity_keeps_one() {
        let feed = AlertFeed::new(0);
        feed.push(alert(1));
        feed.push(alert(2));
        assert_eq!(feed.recent().len(), 1);
    }
}
