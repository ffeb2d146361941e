//! Path utilities for determining data storage locations.
//!
//! Data lives in `~/.todo-reminder/`: the task database and the optional
//! configuration file.

use std::path::PathBuf;

/// The base directory name for todo-reminder data.
const DATA_DIR_NAME: &str = ".todo-reminder";

/// The database filename.
pub const DATABASE_FILENAME: &str = "tasks.sqlite3";

/// The configuration filename.
pub const CONFIG_FILENAME: &str = "config.yaml";

/// Get the base data directory.
///
/// Returns `~/.todo-reminder/` or `None` if the home directory
/// cannot be determined.
#[must_use]
pub fn data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DATA_DIR_NAME))
}

/// Default database path, `~/.todo-reminder/tasks.sqlite3`.
///
/// Falls back to a file in the working directory when there is no home
/// directory.
#[must_use]
pub fn default_db_path() -> PathBuf {
    data_dir().map_or_else(|| PathBuf::from(DATABASE_FILENAME), |dir| dir.join(DATABASE_FILENAME))
}

/// Default configuration path, `~/.todo-reminder/config.yaml`.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join(CONFIG_FILENAME))
}
