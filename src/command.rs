//! Real command execution implementation.

use crate::error::Result;
use crate::traits::{CommandOutput, CommandRunner};
use std::io::Read;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// How often a running child is polled while a timeout is in force.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Exit code reported for a child killed on timeout.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Command runner that launches real processes.
#[derive(Debug, Default, Clone)]
pub struct RealCommandRunner;

impl RealCommandRunner {
    /// Create a new command runner.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl CommandRunner for RealCommandRunner {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> Result<CommandOutput> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let Some(timeout) = timeout else {
            let output = child.wait_with_output()?;
            return Ok(CommandOutput {
                exit_code: output.status.code().unwrap_or(-1),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        };

        // Notification helpers print almost nothing, so reading the pipes
        // after exit cannot deadlock on a full buffer.
        let started = Instant::now();
        let exit_code = loop {
            if let Some(status) = child.try_wait()? {
                break status.code().unwrap_or(-1);
            }
            if started.elapsed() >= timeout {
                let _ = child.kill();
                let _ = child.wait();
                break TIMEOUT_EXIT_CODE;
            }
            std::thread::sleep(POLL_INTERVAL);
        };

        let mut stdout = String::new();
        let mut stderr = String::new();
        if let Some(mut pipe) = child.stdout.take() {
            let _ = pipe.read_to_string(&mut stdout);
        }
        if let Some(mut pipe) = child.stderr.take() {
            let _ = pipe.read_to_string(&mut stderr);
        }

        Ok(CommandOutput { exit_code, stdout, stderr })
    }

    fn is_available(&self, program: &str) -> bool {
        Command::new("which")
            .arg(program)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }
}
