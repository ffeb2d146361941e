//! Error types for `todo_reminder`.

use crate::tasks::ValidationError;

/// Errors that can occur while storing, checking, or serving tasks.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON serialization error occurred.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML parsing error occurred.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A `SQLite` database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A template error occurred.
    #[error("Template error: {0}")]
    Template(String),

    /// The configuration is invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A task could not be created because its input was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A task id does not exist in the store.
    #[error("task not found: {0}")]
    TaskNotFound(i64),

    /// A desktop notification could not be delivered.
    #[error("notification delivery failed: {0}")]
    NotificationFailed(String),
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
