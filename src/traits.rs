//! Core traits for testability and abstraction.

use crate::error::Result;
use std::time::Duration;

/// Output from a command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// The exit code of the command.
    pub exit_code: i32,
    /// The stdout output.
    pub stdout: String,
    /// The stderr output.
    pub stderr: String,
}

impl CommandOutput {
    /// Check if the command succeeded (exit code 0).
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Get combined stdout and stderr.
    #[must_use]
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Trait for running external programs.
///
/// The desktop notifier shells out through this trait so tests can replace
/// the real process launcher.
pub trait CommandRunner: Send + Sync {
    /// Run a program with the given arguments.
    ///
    /// # Arguments
    ///
    /// * `program` - The program to run.
    /// * `args` - The arguments to pass.
    /// * `timeout` - Kill the program if it runs longer than this.
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be spawned or waited on.
    fn run(&self, program: &str, args: &[&str], timeout: Option<Duration>)
        -> Result<CommandOutput>;

    /// Check if a program is available in PATH.
    fn is_available(&self, program: &str) -> bool;
}
