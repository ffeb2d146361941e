//! Task model types for the to-do list.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Format used to persist timestamps. Lexicographic order equals time order.
pub const STORAGE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format used when showing timestamps to the user.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Width of the "due soon" view, in hours.
pub const DUE_SOON_HOURS: i64 = 24;

/// How close an open task's deadline must be for the approaching alert, in minutes.
pub const APPROACH_WINDOW_MINUTES: i64 = 30;

/// Task priority levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Priority {
    /// Do this first.
    High,
    /// Medium priority (default).
    #[default]
    Medium,
    /// Can wait.
    Low,
}

impl Priority {
    /// All priorities, most important first.
    pub const ALL: [Self; 3] = [Self::High, Self::Medium, Self::Low];

    /// Parse a priority from a string, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid priority.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, InvalidPriority> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(InvalidPriority(s.to_string())),
        }
    }

    /// Get the string representation of the priority.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid priority string is provided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPriority(pub String);

impl std::fmt::Display for InvalidPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid priority: '{}' (must be one of: High, Medium, Low)", self.0)
    }
}

impl std::error::Error for InvalidPriority {}

/// Which subset of tasks a list view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewFilter {
    /// Every task.
    #[default]
    All,
    /// Completed tasks only.
    Completed,
    /// Incomplete tasks whose deadline falls within the next 24 hours.
    Due,
}

impl ViewFilter {
    /// All views in the order the page shows them.
    pub const ALL: [Self; 3] = [Self::All, Self::Completed, Self::Due];

    /// Query-string value for this view.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Completed => "completed",
            Self::Due => "due",
        }
    }

    /// Human-readable label for the view selector.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::All => "All Tasks",
            Self::Completed => "Completed Tasks",
            Self::Due => "Due within 1 day",
        }
    }
}

/// Reasons a new task is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The title is empty or whitespace.
    #[error("Please enter a task name.")]
    EmptyTitle,

    /// The deadline is before the current time.
    #[error("Deadline {0} is in the past. Pick a date and time from now on.")]
    DeadlineInPast(String),

    /// The notify time is before the current time.
    #[error("Notify time {0} is in the past. Pick a date and time from now on.")]
    NotifyTimeInPast(String),

    /// The notify time is after the deadline.
    #[error("Notify time {notify_time} is after the deadline {deadline}.")]
    NotifyAfterDeadline {
        /// The requested notify time.
        notify_time: String,
        /// The requested deadline.
        deadline: String,
    },

    /// A date or time field could not be parsed.
    #[error("Invalid {field}: '{value}'")]
    InvalidDateTime {
        /// Which form field was wrong.
        field: &'static str,
        /// The raw value received.
        value: String,
    },

    /// The priority is not one of the known levels.
    #[error("{0}")]
    InvalidPriority(InvalidPriority),
}

impl From<InvalidPriority> for ValidationError {
    fn from(value: InvalidPriority) -> Self {
        Self::InvalidPriority(value)
    }
}

/// A task in the to-do list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique, auto-assigned identifier.
    pub id: i64,
    /// Short title describing the task.
    pub title: String,
    /// Person who assigned the task.
    pub assignee: Option<String>,
    /// The assignee's role or position.
    pub designation: Option<String>,
    /// Priority level.
    pub priority: Priority,
    /// When the task should be finished.
    pub deadline: NaiveDateTime,
    /// When the reminder notification should fire.
    pub notify_time: NaiveDateTime,
    /// Whether the task has been completed.
    pub completed: bool,
    /// Whether the reminder for `notify_time` has been delivered.
    pub notified: bool,
    /// Whether the overdue alert for `deadline` has been delivered.
    pub deadline_notified: bool,
    /// Whether the "deadline approaching" alert has been delivered.
    pub approach_notified: bool,
    /// When the task was created.
    pub created_at: NaiveDateTime,
}

impl Task {
    /// Check if the deadline has passed and the task is still open.
    #[must_use]
    pub fn is_overdue(&self, now: NaiveDateTime) -> bool {
        !self.completed && self.deadline < now
    }

    /// Check if the task belongs in the "due within 1 day" view.
    #[must_use]
    pub fn is_due_soon(&self, now: NaiveDateTime) -> bool {
        !self.completed
            && self.deadline >= now
            && self.deadline <= now + Duration::hours(DUE_SOON_HOURS)
    }

    /// Check if the deadline is less than [`APPROACH_WINDOW_MINUTES`] away
    /// and has not passed.
    #[must_use]
    pub fn is_approaching(&self, now: NaiveDateTime) -> bool {
        !self.completed
            && self.deadline >= now
            && self.deadline < now + Duration::minutes(APPROACH_WINDOW_MINUTES)
    }
}

/// Input for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Short title describing the task.
    pub title: String,
    /// Person who assigned the task.
    pub assignee: Option<String>,
    /// The assignee's role or position.
    pub designation: Option<String>,
    /// Priority level.
    pub priority: Priority,
    /// When the task should be finished.
    pub deadline: NaiveDateTime,
    /// When the reminder notification should fire.
    pub notify_time: NaiveDateTime,
}

impl NewTask {
    /// Create a task input with no assignee and medium priority.
    #[must_use]
    pub fn new(title: &str, deadline: NaiveDateTime, notify_time: NaiveDateTime) -> Self {
        Self {
            title: title.to_string(),
            assignee: None,
            designation: None,
            priority: Priority::default(),
            deadline,
            notify_time,
        }
    }

    /// Check the input against the clock.
    ///
    /// # Errors
    ///
    /// Returns the first rule the input breaks.
    pub fn validate(&self, now: NaiveDateTime) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.deadline < now {
            return Err(ValidationError::DeadlineInPast(display_time(self.deadline)));
        }
        if self.notify_time < now {
            return Err(ValidationError::NotifyTimeInPast(display_time(self.notify_time)));
        }
        if self.notify_time > self.deadline {
            return Err(ValidationError::NotifyAfterDeadline {
                notify_time: display_time(self.notify_time),
                deadline: display_time(self.deadline),
            });
        }
        Ok(())
    }
}

/// The current local wall-clock time, the clock every comparison uses.
#[must_use]
pub fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Format a timestamp for display.
#[must_use]
pub fn display_time(t: NaiveDateTime) -> String {
    t.format(DISPLAY_FORMAT).to_string()
}

/// Format a timestamp for storage.
#[must_use]
pub fn storage_time(t: NaiveDateTime) -> String {
    t.format(STORAGE_FORMAT).to_string()
}

/// Turn empty or whitespace-only optional text into `None`.
#[must_use]
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_priority_from_str() {
        assert_eq!(Priority::from_str("High").unwrap(), Priority::High);
        assert_eq!(Priority::from_str("medium").unwrap(), Priority::Medium);
        assert_eq!(Priority::from_str(" LOW ").unwrap(), Priority::Low);
        assert!(Priority::from_str("urgent").is_err());
    }

    #[test]
    fn test_priority_default_and_ordering() {
        assert_eq!(Priority::default(), Priority::Medium);
        assert!(Priority::High < Priority::Medium);
        assert!(Priority::Medium < Priority::Low);
    }

    #[test]
    fn test_invalid_priority_display() {
        let err = InvalidPriority("urgent".to_string());
        assert!(err.to_string().contains("urgent"));
        assert!(err.to_string().contains("High"));
    }

    #[test]
    fn test_view_filter_serde_names() {
        let parsed: ViewFilter = serde_json::from_str("\"due\"").unwrap();
        assert_eq!(parsed, ViewFilter::Due);
        for view in ViewFilter::ALL {
            let json = serde_json::to_string(&view).unwrap();
            assert_eq!(json, format!("\"{}\"", view.as_str()));
        }
    }

    #[test]
    fn test_validate_accepts_future_times() {
        let task = NewTask::new("Write report", at(12, 0), at(11, 0));
        assert!(task.validate(at(10, 0)).is_ok());
    }

    #[test]
    fn test_validate_accepts_times_equal_to_now() {
        let task = NewTask::new("Right now", at(10, 0), at(10, 0));
        assert!(task.validate(at(10, 0)).is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_title() {
        let task = NewTask::new("   ", at(12, 0), at(11, 0));
        assert_eq!(task.validate(at(10, 0)), Err(ValidationError::EmptyTitle));
    }

    #[test]
    fn test_validate_rejects_past_deadline() {
        let task = NewTask::new("Late", at(9, 0), at(11, 0));
        assert!(matches!(task.validate(at(10, 0)), Err(ValidationError::DeadlineInPast(_))));
    }

    #[test]
    fn test_validate_rejects_past_notify_time() {
        let task = NewTask::new("Late reminder", at(12, 0), at(9, 59));
        assert!(matches!(task.validate(at(10, 0)), Err(ValidationError::NotifyTimeInPast(_))));
    }

    #[test]
    fn test_validate_rejects_notify_after_deadline() {
        let task = NewTask::new("Backwards", at(11, 0), at(12, 0));
        assert!(matches!(
            task.validate(at(10, 0)),
            Err(ValidationError::NotifyAfterDeadline { .. })
        ));
    }

    #[test]
    fn test_due_soon_window() {
        let now = at(10, 0);
        let mut task = Task {
            id: 1,
            title: "Test".to_string(),
            assignee: None,
            designation: None,
            priority: Priority::Medium,
            deadline: now + Duration::hours(24),
            notify_time: now,
            completed: false,
            notified: false,
            deadline_notified: false,
            approach_notified: false,
            created_at: now,
        };
        assert!(task.is_due_soon(now));

        task.deadline = now + Duration::hours(24) + Duration::seconds(1);
        assert!(!task.is_due_soon(now));

        task.deadline = now - Duration::seconds(1);
        assert!(!task.is_due_soon(now));
        assert!(task.is_overdue(now));

        task.completed = true;
        assert!(!task.is_overdue(now));
    }

    #[test]
    fn test_approaching_window() {
        let now = at(10, 0);
        let mut task = Task {
            id: 2,
            title: "Call back".to_string(),
            assignee: None,
            designation: None,
            priority: Priority::Low,
            deadline: now + Duration::minutes(29),
            notify_time: now,
            completed: false,
            notified: false,
            deadline_notified: false,
            approach_notified: false,
            created_at: now,
        };
        assert!(task.is_approaching(now));

        task.deadline = now;
        assert!(task.is_approaching(now));

        task.deadline = now + Duration::minutes(APPROACH_WINDOW_MINUTES);
        assert!(!task.is_approaching(now));

        task.deadline = now - Duration::seconds(1);
        assert!(!task.is_approaching(now));

        task.deadline = now + Duration::minutes(5);
        task.completed = true;
        assert!(!task.is_approaching(now));
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  Ana ".to_string())), Some("Ana".to_string()));
        assert_eq!(non_blank(Some("   ".to_string())), None);
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn test_task_serialization() {
        let task = Task {
            id: 3,
            title: "Ship it".to_string(),
            assignee: Some("Ana".to_string()),
            designation: Some("Lead".to_string()),
            priority: Priority::High,
            deadline: at(12, 0),
            notify_time: at(11, 30),
            completed: false,
            notified: true,
            deadline_notified: false,
            approach_notified: true,
            created_at: at(9, 0),
        };

        let json = serde_json::to_string(&task).unwrap();
        let parsed: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, task);
    }
}
