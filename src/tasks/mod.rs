//! Task storage.
//!
//! This module provides the to-do list's only entity and its store:
//! - Tasks with a title, assignee, priority, deadline, and notify time
//! - Views over the list (all, completed, due within a day)
//! - Flags recording which reminders have already been delivered
//!
//! # Example
//!
//! ```no_run
//! use chrono::{Duration, Local};
//! use todo_reminder::tasks::{NewTask, SqliteTaskStore, TaskStore, ViewFilter};
//!
//! let store = SqliteTaskStore::new("/tmp/tasks.db").unwrap();
//! let now = Local::now().naive_local();
//!
//! let task = store
//!     .create_task(&NewTask::new("Send invoice", now + Duration::hours(2), now + Duration::hours(1)), now)
//!     .unwrap();
//! store.complete_task(task.id).unwrap();
//!
//! let done = store.list_tasks(ViewFilter::Completed, now).unwrap();
//! assert_eq!(done.len(), 1);
//! ```

pub mod models;
pub mod store;

pub use models::{
    display_time, local_now, InvalidPriority, NewTask, Priority, Task, ValidationError, ViewFilter,
};
pub use store::{SqliteTaskStore, TaskCounts, TaskStore};
