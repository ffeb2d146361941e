//! What the task page shows, and the form that feeds it.

use crate::alerts::{Alert, AlertKind};
use crate::tasks::{
    display_time, NewTask, Priority, Task, TaskCounts, ValidationError, ViewFilter,
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// One-shot message carried through a redirect in the query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flash {
    /// A task was added.
    Created,
    /// A task was marked complete.
    Completed,
    /// The task to complete does not exist.
    NotFound,
}

impl Flash {
    /// Query-string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Completed => "completed",
            Self::NotFound => "not_found",
        }
    }

    /// Parse a query-string value. Unknown values are ignored.
    #[must_use]
    pub fn from_query(value: &str) -> Option<Self> {
        match value {
            "created" => Some(Self::Created),
            "completed" => Some(Self::Completed),
            "not_found" => Some(Self::NotFound),
            _ => None,
        }
    }

    /// Where to send the browser after the action, keeping the view it came from.
    #[must_use]
    pub fn redirect_target(self, view: ViewFilter) -> String {
        format!("/?view={}&flash={}", view.as_str(), self.as_str())
    }

    const fn message(self) -> &'static str {
        match self {
            Self::Created => "Task added successfully!",
            Self::Completed => "Task marked as complete.",
            Self::NotFound => "That task no longer exists.",
        }
    }

    const fn level(self) -> &'static str {
        match self {
            Self::Created | Self::Completed => "success",
            Self::NotFound => "warning",
        }
    }
}

/// Parse the `view` query parameter. Missing or unknown values show all tasks.
#[must_use]
pub fn parse_view(value: Option<&str>) -> ViewFilter {
    ViewFilter::ALL
        .into_iter()
        .find(|v| value.is_some_and(|s| s.eq_ignore_ascii_case(v.as_str())))
        .unwrap_or_default()
}

/// The creation form as submitted.
///
/// Every field is kept as raw text so a rejected submission can be shown
/// back to the user unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskForm {
    /// Task name.
    pub title: String,
    /// Who assigned it.
    pub assignee: String,
    /// The assigner's role.
    pub designation: String,
    /// `High`, `Medium` or `Low`.
    pub priority: String,
    /// `YYYY-MM-DD`
    pub deadline_date: String,
    /// `HH:MM`
    pub deadline_time: String,
    /// `YYYY-MM-DD`
    pub notify_date: String,
    /// `HH:MM`
    pub notify_time: String,
    /// The list view the form was submitted from.
    pub view: String,
}

impl TaskForm {
    /// An empty form with the default priority selected.
    #[must_use]
    pub fn blank() -> Self {
        Self { priority: Priority::default().as_str().to_string(), ..Self::default() }
    }

    /// Convert the submitted text into a task input.
    ///
    /// Only parsing happens here; time-based rules are checked by the store.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an unparsable date, time or priority.
    pub fn to_new_task(&self) -> Result<NewTask, ValidationError> {
        let priority = if self.priority.trim().is_empty() {
            Priority::default()
        } else {
            Priority::from_str(&self.priority)?
        };
        Ok(NewTask {
            title: self.title.trim().to_string(),
            assignee: Some(self.assignee.clone()),
            designation: Some(self.designation.clone()),
            priority,
            deadline: parse_datetime("deadline", &self.deadline_date, &self.deadline_time)?,
            notify_time: parse_datetime("notify time", &self.notify_date, &self.notify_time)?,
        })
    }
}

fn parse_datetime(
    field: &'static str,
    date: &str,
    time: &str,
) -> Result<NaiveDateTime, ValidationError> {
    let invalid = || ValidationError::InvalidDateTime {
        field,
        value: format!("{} {}", date.trim(), time.trim()).trim().to_string(),
    };
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|_| invalid())?;
    let time = NaiveTime::parse_from_str(time.trim(), "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time.trim(), "%H:%M:%S"))
        .map_err(|_| invalid())?;
    Ok(date.and_time(time))
}

#[derive(Debug, Serialize)]
struct FlashView {
    level: &'static str,
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct ViewOption {
    value: &'static str,
    label: &'static str,
    selected: bool,
}

#[derive(Debug, Serialize)]
struct TaskRow {
    id: i64,
    title: String,
    assignee: String,
    designation: String,
    priority: &'static str,
    deadline: String,
    notify_time: String,
    completed: bool,
    notified: bool,
    overdue: bool,
    approaching: bool,
}

impl TaskRow {
    fn new(task: Task, now: NaiveDateTime) -> Self {
        let overdue = task.is_overdue(now);
        let approaching = task.is_approaching(now);
        Self {
            id: task.id,
            title: task.title,
            assignee: task.assignee.unwrap_or_default(),
            designation: task.designation.unwrap_or_default(),
            priority: task.priority.as_str(),
            deadline: display_time(task.deadline),
            notify_time: display_time(task.notify_time),
            completed: task.completed,
            notified: task.notified,
            overdue,
            approaching,
        }
    }
}

#[derive(Debug, Serialize)]
struct AlertRow {
    at: String,
    kind: AlertKind,
    message: String,
}

/// Everything the page template needs.
#[derive(Debug, Serialize)]
pub struct PageContext {
    view: &'static str,
    view_label: &'static str,
    views: Vec<ViewOption>,
    counts: TaskCounts,
    tasks: Vec<TaskRow>,
    alerts: Vec<AlertRow>,
    flash: Option<FlashView>,
    error: Option<String>,
    form: TaskForm,
    priorities: Vec<&'static str>,
}

/// Inputs to one page render, apart from stored data.
#[derive(Debug, Clone)]
pub struct PageRequest {
    /// Which tasks to list.
    pub view: ViewFilter,
    /// Message from the previous action.
    pub flash: Option<Flash>,
    /// Why the last submission was rejected.
    pub error: Option<String>,
    /// Values to pre-fill the form with.
    pub form: TaskForm,
}

impl PageRequest {
    /// A plain page load.
    #[must_use]
    pub fn new(view: ViewFilter, flash: Option<Flash>) -> Self {
        Self { view, flash, error: None, form: TaskForm::blank() }
    }

    /// The page shown again after a rejected submission, in the view it came from.
    #[must_use]
    pub fn rejected(form: TaskForm, error: String) -> Self {
        let view = parse_view(Some(form.view.as_str()));
        Self { view, flash: None, error: Some(error), form }
    }
}

impl PageContext {
    /// Combine a request with the stored tasks and recent alerts.
    #[must_use]
    pub fn build(
        request: PageRequest,
        tasks: Vec<Task>,
        counts: TaskCounts,
        alerts: Vec<Alert>,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            view: request.view.as_str(),
            view_label: request.view.label(),
            views: ViewFilter::ALL
                .into_iter()
                .map(|v| ViewOption { value: v.as_str(), label: v.label(), selected: v == request.view })
                .collect(),
            counts,
            tasks: tasks.into_iter().map(|t| TaskRow::new(t, now)).collect(),
            alerts: alerts
                .into_iter()
                .map(|a| AlertRow { at: display_time(a.at), kind: a.kind, message: a.message })
                .collect(),
            flash: request.flash.map(|f| FlashView { level: f.level(), message: f.message() }),
            error: request.error,
            form: request.form,
            priorities: Priority::ALL.iter().map(Priority::as_str).collect(),
        }
    }
}
