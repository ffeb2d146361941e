//! Configuration management for todo-reminder.
//!
//! Settings come from `~/.todo-reminder/config.yaml` (or a file given with
//! `--config`). Every field has a default, so a missing file or a partial
//! one is fine. Command-line flags are applied on top with
//! [`AppConfig::apply_overrides`].

use crate::alerts::DEFAULT_ALERT_HISTORY;
use crate::checker::{DEFAULT_CHECK_INTERVAL_SECS, DEFAULT_NOTIFICATION_TIMEOUT_SECS};
use crate::error::{Error, Result};
use crate::notifier::NotifierKind;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default listen address.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8080;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite database file.
    pub database_path: PathBuf,

    /// Address the web page listens on.
    pub host: String,

    /// Port the web page listens on.
    pub port: u16,

    /// Seconds between deadline checks.
    pub check_interval_secs: u64,

    /// Seconds a popup stays on screen.
    pub notification_timeout_secs: u64,

    /// How notifications are delivered.
    pub notifier: NotifierKind,

    /// Directory of templates overriding the built-in ones.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates_dir: Option<PathBuf>,

    /// Number of recent alerts shown on the page.
    pub alert_history: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: paths::default_db_path(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            check_interval_secs: DEFAULT_CHECK_INTERVAL_SECS,
            notification_timeout_secs: DEFAULT_NOTIFICATION_TIMEOUT_SECS,
            notifier: NotifierKind::default(),
            templates_dir: None,
            alert_history: DEFAULT_ALERT_HISTORY,
        }
    }
}

/// Values given on the command line. `None` keeps the configured value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// `--db`
    pub database_path: Option<PathBuf>,
    /// `--host`
    pub host: Option<String>,
    /// `--port`
    pub port: Option<u16>,
    /// `--interval`
    pub check_interval_secs: Option<u64>,
}

impl AppConfig {
    /// Load config from an explicit path, or from the default location.
    ///
    /// An explicit path must exist. A missing default file gives defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path)?
                .ok_or_else(|| Error::Config(format!("config file not found: {}", path.display()))),
            None => match paths::default_config_path() {
                Some(path) => Ok(Self::load_from(&path)?.unwrap_or_default()),
                None => Ok(Self::default()),
            },
        }
    }

    /// Load config from a file, returning None if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load_from(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Some(Self::default()));
        }
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(Some(config))
    }

    /// Apply command-line values over the loaded ones.
    #[must_use]
    pub fn apply_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(path) = overrides.database_path {
            self.database_path = path;
        }
        if let Some(host) = overrides.host {
            self.host = host;
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(secs) = overrides.check_interval_secs {
            self.check_interval_secs = secs;
        }
        self
    }

    /// Check that the settings are usable.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` describing the first bad setting.
    pub fn validate(&self) -> Result<()> {
        if self.check_interval_secs == 0 {
            return Err(Error::Config("check_interval_secs must be greater than 0".to_string()));
        }
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("database_path must not be empty".to_string()));
        }
        self.socket_addr()?;
        Ok(())
    }

    /// The address to bind.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if host and port do not form an address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| Error::Config(format!("invalid listen address {}:{}: {e}", self.host, self.port)))
    }

    /// Time between deadline checks.
    #[must_use]
    pub const fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }
}
