//! Types for the runner module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Exit code reported for a command killed after exceeding its timeout.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Exit code reported for a command terminated by a signal.
pub const SIGNAL_EXIT_CODE: i32 = -1;

/// A resolved command: the program followed by its arguments.
///
/// Tokens are passed to the program as discrete arguments, never through a shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandSpec {
    tokens: Vec<String>,
}

impl CommandSpec {
    /// Creates a command from its tokens.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// The program to run, if any.
    pub fn program(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    /// Arguments after the program.
    pub fn args(&self) -> &[String] {
        self.tokens.get(1..).unwrap_or_default()
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tokens.join(" "))
    }
}

/// Result of one completed (or forcibly terminated) command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Process exit code. `TIMEOUT_EXIT_CODE` on timeout, `SIGNAL_EXIT_CODE`
    /// when killed by a signal.
    pub exit_code: i32,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
    /// Wall-clock time from spawn to exit.
    pub duration: Duration,
    /// Whether the process was killed for exceeding its timeout.
    pub timed_out: bool,
}

impl ExecutionResult {
    /// Whether the process exited normally with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration.as_millis() as u64
    }
}
