//! Desktop notification delivery.
//!
//! Delivery is best-effort. A failed send is reported as
//! [`Error::NotificationFailed`] and never takes the process down; the
//! deadline checker logs it and tries again on its next tick.

use crate::command::RealCommandRunner;
use crate::error::{Error, Result};
use crate::traits::CommandRunner;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Application name shown by the notification daemon.
pub const APP_NAME: &str = "todo-reminder";

/// How long the helper program may take before it is killed.
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// A popup to show the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Popup heading.
    pub title: String,
    /// Popup body.
    pub message: String,
    /// How long the popup stays on screen, in seconds.
    pub timeout_secs: u64,
}

/// Sends notifications to the user.
pub trait Notifier: Send + Sync {
    /// Deliver a notification.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotificationFailed`] if the notification could not be shown.
    fn send(&self, notification: &Notification) -> Result<()>;
}

/// Which notifier the application uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    /// OS-level popups.
    #[default]
    Desktop,
    /// Log lines only, for headless machines.
    Log,
}

/// Desktop platforms with a known notification helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Freedesktop systems, via `notify-send`.
    Freedesktop,
    /// macOS, via `osascript`.
    MacOs,
    /// Anything else. Sending always fails.
    Unsupported,
}

impl Platform {
    /// The platform this binary was built for.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(any(
            target_os = "linux",
            target_os = "freebsd",
            target_os = "openbsd",
            target_os = "netbsd",
            target_os = "dragonfly"
        )) {
            Self::Freedesktop
        } else {
            Self::Unsupported
        }
    }
}

/// Shows OS-level popups by running the platform's notification helper.
#[derive(Debug, Clone)]
pub struct DesktopNotifier<R: CommandRunner = RealCommandRunner> {
    runner: R,
    platform: Platform,
}

impl DesktopNotifier {
    /// Create a notifier for the current platform.
    #[must_use]
    pub const fn new() -> Self {
        Self { runner: RealCommandRunner::new(), platform: Platform::current() }
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: CommandRunner> DesktopNotifier<R> {
    /// Create a notifier with an explicit runner and platform.
    pub const fn with_runner(runner: R, platform: Platform) -> Self {
        Self { runner, platform }
    }

    fn helper_invocation(&self, n: &Notification) -> Result<(&'static str, Vec<String>)> {
        match self.platform {
            Platform::Freedesktop => Ok((
                "notify-send",
                vec![
                    format!("--app-name={APP_NAME}"),
                    format!("--expire-time={}", n.timeout_secs.saturating_mul(1000)),
                    n.title.clone(),
                    n.message.clone(),
                ],
            )),
            Platform::MacOs => Ok((
                "osascript",
                vec![
                    "-e".to_string(),
                    format!(
                        "display notification \"{}\" with title \"{}\"",
                        applescript_escape(&n.message),
                        applescript_escape(&n.title)
                    ),
                ],
            )),
            Platform::Unsupported => Err(Error::NotificationFailed(
                "desktop notifications are not supported on this platform".to_string(),
            )),
        }
    }
}

impl<R: CommandRunner> Notifier for DesktopNotifier<R> {
    fn send(&self, notification: &Notification) -> Result<()> {
        let (program, args) = self.helper_invocation(notification)?;
        if !self.runner.is_available(program) {
            return Err(Error::NotificationFailed(format!("{program} is not installed")));
        }
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();

        let output = self
            .runner
            .run(program, &arg_refs, Some(SEND_TIMEOUT))
            .map_err(|e| Error::NotificationFailed(format!("could not run {program}: {e}")))?;

        if !output.success() {
            return Err(Error::NotificationFailed(format!(
                "{program} exited with code {}: {}",
                output.exit_code,
                output.combined_output().trim()
            )));
        }
        Ok(())
    }
}

/// Writes notifications to the log instead of the desktop.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, notification: &Notification) -> Result<()> {
        info!(title = %notification.title, message = %notification.message, "notification");
        Ok(())
    }
}

/// Build the notifier selected in the configuration.
#[must_use]
pub fn build_notifier(kind: NotifierKind) -> Arc<dyn Notifier> {
    match kind {
        NotifierKind::Desktop => Arc::new(DesktopNotifier::new()),
        NotifierKind::Log => Arc::new(LogNotifier),
    }
}

/// Escape a string for use inside an `AppleScript` string literal.
fn applescript_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
