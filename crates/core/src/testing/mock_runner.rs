//! Mock command runner for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::runner::{CommandRunner, CommandSpec, ExecutionResult, RunnerError, TIMEOUT_EXIT_CODE};

/// A scripted response for one `execute` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedRun {
    /// Exit with the given code and stderr, without writing output.
    Exit { exit_code: i32, stderr: String },
    /// Fail to launch as if the binary were missing.
    LaunchFailure,
    /// Report a timeout.
    Timeout,
}

/// Mock implementation of the `CommandRunner` trait.
///
/// Provides controllable behavior for testing:
/// - Record every command for assertions
/// - Write a fixed output to the command's last argument (the target path)
/// - Script failures for upcoming calls
/// - Simulate slow commands
///
/// # Example
///
/// ```rust,ignore
/// use tengine_core::testing::MockRunner;
///
/// let runner = MockRunner::new();
/// runner.write_target_on_success(b"<html>Hola</html>".to_vec()).await;
/// runner.set_next_result(1, "invalid input").await;
///
/// // First call fails with stderr, later calls write the output file.
/// ```
#[derive(Debug, Clone)]
pub struct MockRunner {
    /// Recorded commands.
    commands: Arc<RwLock<Vec<CommandSpec>>>,
    /// Responses for upcoming calls, consumed in order.
    scripted: Arc<RwLock<VecDeque<ScriptedRun>>>,
    /// Bytes written to the last argument on an unscripted call.
    output: Arc<RwLock<Option<Vec<u8>>>>,
    /// Simulated execution time.
    delay: Arc<RwLock<Duration>>,
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRunner {
    /// Create a new mock runner. Unscripted calls exit 0 and write nothing.
    pub fn new() -> Self {
        Self {
            commands: Arc::new(RwLock::new(Vec::new())),
            scripted: Arc::new(RwLock::new(VecDeque::new())),
            output: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
        }
    }

    /// Get all recorded commands.
    pub async fn recorded_commands(&self) -> Vec<CommandSpec> {
        self.commands.read().await.clone()
    }

    /// Get the number of commands executed.
    pub async fn call_count(&self) -> usize {
        self.commands.read().await.len()
    }

    /// Write `bytes` to the command's last argument on unscripted calls.
    pub async fn write_target_on_success(&self, bytes: Vec<u8>) {
        *self.output.write().await = Some(bytes);
    }

    /// Queue an exit with the given code and stderr.
    pub async fn set_next_result(&self, exit_code: i32, stderr: impl Into<String>) {
        self.push(ScriptedRun::Exit {
            exit_code,
            stderr: stderr.into(),
        })
        .await;
    }

    /// Queue a launch failure.
    pub async fn set_next_launch_failure(&self) {
        self.push(ScriptedRun::LaunchFailure).await;
    }

    /// Queue a timeout.
    pub async fn set_next_timeout(&self) {
        self.push(ScriptedRun::Timeout).await;
    }

    /// Queue an arbitrary response.
    pub async fn push(&self, run: ScriptedRun) {
        self.scripted.write().await.push_back(run);
    }

    /// Set the simulated execution time.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    fn result(exit_code: i32, stderr: String, duration: Duration, timed_out: bool) -> ExecutionResult {
        ExecutionResult {
            exit_code,
            stdout: String::new(),
            stderr,
            duration,
            timed_out,
        }
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    fn name(&self) -> &str {
        "mock"
    }

    async fn execute(
        &self,
        command: &CommandSpec,
        _timeout: Duration,
    ) -> Result<ExecutionResult, RunnerError> {
        self.commands.write().await.push(command.clone());

        let program = command.program().ok_or(RunnerError::EmptyCommand)?;

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.scripted.write().await.pop_front();
        match scripted {
            Some(ScriptedRun::Exit { exit_code, stderr }) => {
                Ok(Self::result(exit_code, stderr, delay, false))
            }
            Some(ScriptedRun::LaunchFailure) => Err(RunnerError::launch(
                program,
                std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
            )),
            Some(ScriptedRun::Timeout) => {
                Ok(Self::result(TIMEOUT_EXIT_CODE, String::new(), delay, true))
            }
            None => {
                if let Some(bytes) = self.output.read().await.as_ref() {
                    if let Some(target) = command.args().last() {
                        tokio::fs::write(Path::new(target), bytes)
                            .await
                            .map_err(|e| RunnerError::Io {
                                program: program.to_string(),
                                source: e,
                            })?;
                    }
                }
                Ok(Self::result(0, String::new(), delay, false))
            }
        }
    }
}
