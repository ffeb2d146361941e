//! Testing utilities and mock implementations.

use crate::error::{Error, Result};
use crate::notifier::{Notification, Notifier};
use crate::traits::{CommandOutput, CommandRunner};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// An expected invocation. `None` args match any arguments.
type Expectation = (String, Option<Vec<String>>, CommandOutput);

/// A mock command runner for testing.
///
/// Records expected commands and their outputs, then verifies they were called.
#[derive(Debug, Default)]
pub struct MockCommandRunner {
    expectations: Mutex<Vec<Expectation>>,
    available_programs: Mutex<Vec<String>>,
    call_index: Mutex<usize>,
}

impl MockCommandRunner {
    /// Create a new mock command runner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an expected command and its output.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn expect(&self, program: &str, args: &[&str], output: CommandOutput) {
        self.expectations.lock().unwrap().push((
            program.to_string(),
            Some(args.iter().map(|s| (*s).to_string()).collect()),
            output,
        ));
    }

    /// Add an expected command whose arguments are not checked.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn expect_any(&self, program: &str, output: CommandOutput) {
        self.expectations.lock().unwrap().push((program.to_string(), None, output));
    }

    /// Add a program as available.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn set_available(&self, program: &str) {
        self.available_programs.lock().unwrap().push(program.to_string());
    }

    /// Verify all expected commands were called.
    ///
    /// # Panics
    ///
    /// Panics if not all expected commands were called.
    pub fn verify(&self) {
        let index = *self.call_index.lock().unwrap();
        let expected = self.expectations.lock().unwrap().len();
        assert_eq!(
            index, expected,
            "Expected {expected} command calls, but only {index} were made"
        );
    }
}

impl CommandRunner for MockCommandRunner {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        _timeout: Option<Duration>,
    ) -> Result<CommandOutput> {
        let mut index = self.call_index.lock().unwrap();
        let expectations = self.expectations.lock().unwrap();

        assert!(
            *index < expectations.len(),
            "Unexpected command call: {program} {args:?} (no more expectations)"
        );

        let (exp_program, exp_args, output) = &expectations[*index];
        let args_vec: Vec<String> = args.iter().map(|s| (*s).to_string()).collect();

        assert!(
            program == exp_program && exp_args.as_ref().map_or(true, |exp| exp == &args_vec),
            "Command mismatch at index {}:\n  Expected: {} {:?}\n  Got: {} {:?}",
            *index,
            exp_program,
            exp_args,
            program,
            args
        );

        *index += 1;
        Ok(output.clone())
    }

    fn is_available(&self, program: &str) -> bool {
        self.available_programs.lock().unwrap().iter().any(|p| p == program)
    }
}

/// A notifier that records what it was asked to send.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    /// Create a notifier that accepts everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following send fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Notifications delivered so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    /// Number of notifications delivered so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.sent().len()
    }
}

impl Notifier for RecordingNotifier {
    fn send(&self, notification: &Notification) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::NotificationFailed("simulated failure".to_string()));
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}
