//! Task store trait and `SQLite` implementation.

use crate::error::{Error, Result};
use crate::tasks::models::{
    non_blank, storage_time, NewTask, Priority, Task, ViewFilter, APPROACH_WINDOW_MINUTES,
    DUE_SOON_HOURS, STORAGE_FORMAT,
};
use chrono::{Duration, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Notify time given to rows migrated from a schema without one.
/// Rows carrying it never produce a reminder.
const UNSET_NOTIFY_TIME: &str = "1970-01-01 00:00:00";

/// How long a connection waits on a locked database.
const BUSY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

const TASK_COLUMNS: &str = "id, title, assignee, designation, priority, deadline, notify_time,
     completed, notified, deadline_notified, approach_notified, created_at";

/// Timestamp columns. Older databases stored them without seconds.
const TIMESTAMP_COLUMNS: [&str; 3] = ["deadline", "notify_time", "created_at"];

/// Columns that older databases declared `NOT NULL` but are now optional.
const OPTIONAL_TEXT_COLUMNS: [&str; 2] = ["assignee", "designation"];

/// Current table definition, created under `table`.
fn create_table_sql(table: &str) -> String {
    format!(
        r"
        CREATE TABLE IF NOT EXISTS {table} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            deadline TEXT NOT NULL,
            notify_time TEXT NOT NULL,
            assignee TEXT,
            designation TEXT,
            priority TEXT NOT NULL DEFAULT 'Medium'
                CHECK (priority IN ('High', 'Medium', 'Low')),
            completed INTEGER NOT NULL DEFAULT 0,
            notified INTEGER NOT NULL DEFAULT 0,
            deadline_notified INTEGER NOT NULL DEFAULT 0,
            approach_notified INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime'))
        );
        "
    )
}

/// One row of `PRAGMA table_info`.
struct ColumnInfo {
    name: String,
    not_null: bool,
}

/// Trait for task storage operations.
///
/// All methods return a `Result` and may fail with database errors.
#[allow(clippy::missing_errors_doc)]
pub trait TaskStore {
    /// Validate and persist a new task. Nothing is written if validation fails.
    fn create_task(&self, new: &NewTask, now: NaiveDateTime) -> Result<Task>;

    /// Get a task by ID.
    fn get_task(&self, id: i64) -> Result<Option<Task>>;

    /// List the tasks a view shows, ordered by deadline.
    fn list_tasks(&self, filter: ViewFilter, now: NaiveDateTime) -> Result<Vec<Task>>;

    /// Mark a task complete. Completing a completed task changes nothing.
    ///
    /// Fails with [`Error::TaskNotFound`] if the id does not exist.
    fn complete_task(&self, id: i64) -> Result<Task>;

    /// Open tasks whose reminder is due and has not been delivered.
    fn due_reminders(&self, now: NaiveDateTime) -> Result<Vec<Task>>;

    /// Record that a task's reminder was delivered.
    fn mark_notified(&self, id: i64) -> Result<()>;

    /// Open tasks past their deadline whose overdue alert has not been delivered.
    fn overdue_unalerted(&self, now: NaiveDateTime) -> Result<Vec<Task>>;

    /// Record that a task's overdue alert was delivered.
    fn mark_deadline_notified(&self, id: i64) -> Result<()>;

    /// Open tasks whose deadline is less than 30 minutes away and whose
    /// approaching alert has not been delivered.
    fn approaching_unalerted(&self, now: NaiveDateTime) -> Result<Vec<Task>>;

    /// Record that a task's approaching alert was delivered.
    fn mark_approach_notified(&self, id: i64) -> Result<()>;

    /// Count tasks by completion state.
    fn counts(&self) -> Result<TaskCounts>;
}

/// Task totals shown in the page header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskCounts {
    /// Every task.
    pub total: u64,
    /// Completed tasks.
    pub completed: u64,
    /// Tasks still open.
    pub open: u64,
}

/// SQLite-based task store.
#[derive(Debug, Clone)]
pub struct SqliteTaskStore {
    db_path: PathBuf,
}

impl SqliteTaskStore {
    /// Create a new `SQLite` task store at the given database path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let store = Self { db_path: db_path.as_ref().to_path_buf() };
        store.init_schema()?;
        Ok(store)
    }

    /// Get the database path.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Open a connection to the database.
    fn open(&self) -> Result<Connection> {
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&self.db_path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        Ok(conn)
    }

    /// Initialize the database schema and bring older tables up to date.
    fn init_schema(&self) -> Result<()> {
        let mut conn = self.open()?;

        conn.execute_batch(&create_table_sql("tasks"))?;
        Self::migrate(&mut conn)?;

        conn.execute_batch(
            r"
            CREATE INDEX IF NOT EXISTS idx_tasks_completed_deadline ON tasks(completed, deadline);
            CREATE INDEX IF NOT EXISTS idx_tasks_reminders ON tasks(completed, notified, notify_time);
            ",
        )?;

        Ok(())
    }

    /// Bring a table written by an older version up to the current schema.
    ///
    /// Legacy columns are renamed and missing ones added. If the optional
    /// text columns are still `NOT NULL`, the table is rebuilt so they accept
    /// `NULL`. Minute-precision timestamps gain a seconds field so text
    /// comparisons in queries stay chronological.
    fn migrate(conn: &mut Connection) -> Result<()> {
        let mut columns = Self::columns(conn)?;
        let has = |columns: &[ColumnInfo], name: &str| columns.iter().any(|c| c.name == name);

        for (old, new) in [("name", "title"), ("assigned_by", "assignee")] {
            if has(&columns, old) && !has(&columns, new) {
                info!(from = old, to = new, "renaming legacy column");
                conn.execute_batch(&format!("ALTER TABLE tasks RENAME COLUMN {old} TO {new}"))?;
            }
        }
        columns = Self::columns(conn)?;

        let additions = [
            ("notify_time", format!("TEXT NOT NULL DEFAULT '{UNSET_NOTIFY_TIME}'")),
            ("assignee", "TEXT".to_string()),
            ("designation", "TEXT".to_string()),
            ("priority", "TEXT NOT NULL DEFAULT 'Medium'".to_string()),
            ("completed", "INTEGER NOT NULL DEFAULT 0".to_string()),
            ("notified", "INTEGER NOT NULL DEFAULT 0".to_string()),
            ("deadline_notified", "INTEGER NOT NULL DEFAULT 0".to_string()),
            ("approach_notified", "INTEGER NOT NULL DEFAULT 0".to_string()),
            ("created_at", format!("TEXT NOT NULL DEFAULT '{UNSET_NOTIFY_TIME}'")),
        ];
        for (column, definition) in additions {
            if !has(&columns, column) {
                info!(column, "adding missing column");
                conn.execute_batch(&format!("ALTER TABLE tasks ADD COLUMN {column} {definition}"))?;
            }
        }
        columns = Self::columns(conn)?;

        let tx = conn.transaction()?;
        if columns.iter().any(|c| c.not_null && OPTIONAL_TEXT_COLUMNS.contains(&c.name.as_str())) {
            info!("rebuilding legacy table with optional assignee and designation");
            Self::rebuild_table(&tx)?;
        }
        for column in TIMESTAMP_COLUMNS {
            let updated = tx.execute(
                &format!("UPDATE tasks SET {column} = {column} || ':00' WHERE length({column}) = 16"),
                [],
            )?;
            if updated > 0 {
                info!(column, rows = updated, "added seconds to legacy timestamps");
            }
        }
        tx.commit()?;

        Ok(())
    }

    /// Copy every row into a table with the current definition and swap it in.
    fn rebuild_table(conn: &Connection) -> Result<()> {
        conn.execute_batch(&create_table_sql("tasks_rebuilt"))?;
        conn.execute_batch(
            r"
            INSERT INTO tasks_rebuilt
                (id, title, deadline, notify_time, assignee, designation, priority,
                 completed, notified, deadline_notified, approach_notified, created_at)
            SELECT id, title, deadline, notify_time,
                   NULLIF(TRIM(assignee), ''), NULLIF(TRIM(designation), ''),
                   CASE WHEN priority IN ('High', 'Medium', 'Low') THEN priority ELSE 'Medium' END,
                   completed, notified, deadline_notified, approach_notified, created_at
            FROM tasks;
            DROP TABLE tasks;
            ALTER TABLE tasks_rebuilt RENAME TO tasks;
            ",
        )?;
        Ok(())
    }

    fn columns(conn: &Connection) -> Result<Vec<ColumnInfo>> {
        let mut stmt = conn.prepare("PRAGMA table_info(tasks)")?;
        let columns = stmt
            .query_map([], |row| Ok(ColumnInfo { name: row.get(1)?, not_null: row.get::<_, i64>(3)? != 0 }))?
            .collect::<rusqlite::Result<Vec<ColumnInfo>>>()?;
        Ok(columns)
    }

    /// Parse a stored timestamp.
    fn parse_timestamp(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
        let raw: String = row.get(idx)?;
        NaiveDateTime::parse_from_str(&raw, STORAGE_FORMAT).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
    }

    /// Parse a task from a row selected with `TASK_COLUMNS`.
    fn parse_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
        let priority_str: String = row.get(4)?;

        Ok(Task {
            id: row.get(0)?,
            title: row.get(1)?,
            assignee: non_blank(row.get(2)?),
            designation: non_blank(row.get(3)?),
            priority: Priority::from_str(&priority_str).unwrap_or_default(),
            deadline: Self::parse_timestamp(row, 5)?,
            notify_time: Self::parse_timestamp(row, 6)?,
            completed: row.get(7)?,
            notified: row.get(8)?,
            deadline_notified: row.get(9)?,
            approach_notified: row.get(10)?,
            created_at: Self::parse_timestamp(row, 11)?,
        })
    }

    fn select_by_id(conn: &Connection, id: i64) -> Result<Option<Task>> {
        let task = conn
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
                params![id],
                Self::parse_task,
            )
            .optional()?;
        Ok(task)
    }

    fn query_tasks(
        conn: &Connection,
        where_clause: &str,
        order_by: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks {where_clause} ORDER BY {order_by}");
        let mut stmt = conn.prepare(&sql)?;
        let tasks = stmt.query_map(params, Self::parse_task)?.collect::<rusqlite::Result<Vec<Task>>>()?;
        Ok(tasks)
    }

    fn set_flag(&self, id: i64, column: &str) -> Result<()> {
        let conn = self.open()?;
        let rows = conn.execute(&format!("UPDATE tasks SET {column} = 1 WHERE id = ?1"), params![id])?;
        if rows == 0 {
            return Err(Error::TaskNotFound(id));
        }
        Ok(())
    }
}

impl TaskStore for SqliteTaskStore {
    fn create_task(&self, new: &NewTask, now: NaiveDateTime) -> Result<Task> {
        new.validate(now)?;

        let conn = self.open()?;
        conn.execute(
            "INSERT INTO tasks (title, assignee, designation, priority, deadline, notify_time, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                new.title.trim(),
                non_blank(new.assignee.clone()),
                non_blank(new.designation.clone()),
                new.priority.as_str(),
                storage_time(new.deadline),
                storage_time(new.notify_time),
                storage_time(now),
            ],
        )?;
        let id = conn.last_insert_rowid();
        debug!(task_id = id, title = %new.title, "task created");

        Self::select_by_id(&conn, id)?.ok_or(Error::TaskNotFound(id))
    }

    fn get_task(&self, id: i64) -> Result<Option<Task>> {
        let conn = self.open()?;
        Self::select_by_id(&conn, id)
    }

    fn list_tasks(&self, filter: ViewFilter, now: NaiveDateTime) -> Result<Vec<Task>> {
        let conn = self.open()?;

        let mut conditions = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        match filter {
            ViewFilter::All => {}
            ViewFilter::Completed => conditions.push("completed = 1"),
            ViewFilter::Due => {
                conditions.push("completed = 0");
                conditions.push("deadline >= ?");
                params_vec.push(Box::new(storage_time(now)));
                conditions.push("deadline <= ?");
                params_vec.push(Box::new(storage_time(now + Duration::hours(DUE_SOON_HOURS))));
            }
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let params: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(AsRef::as_ref).collect();
        Self::query_tasks(&conn, &where_clause, "deadline ASC, id ASC", &params)
    }

    fn complete_task(&self, id: i64) -> Result<Task> {
        let conn = self.open()?;
        let rows =
            conn.execute("UPDATE tasks SET completed = 1 WHERE id = ?1 AND completed = 0", params![id])?;

        let task = Self::select_by_id(&conn, id)?.ok_or(Error::TaskNotFound(id))?;
        if rows > 0 {
            debug!(task_id = id, "task completed");
        }
        Ok(task)
    }

    fn due_reminders(&self, now: NaiveDateTime) -> Result<Vec<Task>> {
        let conn = self.open()?;
        Self::query_tasks(
            &conn,
            "WHERE completed = 0 AND notified = 0 AND notify_time <= ?1 AND notify_time > ?2",
            "notify_time ASC, id ASC",
            &[&storage_time(now), &UNSET_NOTIFY_TIME],
        )
    }

    fn mark_notified(&self, id: i64) -> Result<()> {
        self.set_flag(id, "notified")
    }

    fn overdue_unalerted(&self, now: NaiveDateTime) -> Result<Vec<Task>> {
        let conn = self.open()?;
        Self::query_tasks(
            &conn,
            "WHERE completed = 0 AND deadline_notified = 0 AND deadline <= ?1",
            "deadline ASC, id ASC",
            &[&storage_time(now)],
        )
    }

    fn mark_deadline_notified(&self, id: i64) -> Result<()> {
        self.set_flag(id, "deadline_notified")
    }

    fn approaching_unalerted(&self, now: NaiveDateTime) -> Result<Vec<Task>> {
        let conn = self.open()?;
        Self::query_tasks(
            &conn,
            "WHERE completed = 0 AND approach_notified = 0 AND deadline >= ?1 AND deadline < ?2",
            "deadline ASC, id ASC",
            &[&storage_time(now), &storage_time(now + Duration::minutes(APPROACH_WINDOW_MINUTES))],
        )
    }

    fn mark_approach_notified(&self, id: i64) -> Result<()> {
        self.set_flag(id, "approach_notified")
    }

    fn counts(&self) -> Result<TaskCounts> {
        let conn = self.open()?;
        let (total, completed): (i64, i64) = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(completed), 0) FROM tasks",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let total = u64::try_from(total).unwrap_or(0);
        let completed = u64::try_from(completed).unwrap_or(0);
        Ok(TaskCounts { total, completed, open: total.saturating_sub(completed) })
    }
}
