//! Process-based runner implementation.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::error::RunnerError;
use super::traits::CommandRunner;
use super::types::{CommandSpec, ExecutionResult, SIGNAL_EXIT_CODE, TIMEOUT_EXIT_CODE};

/// Maximum bytes kept per output stream (10 MiB). Output past the cap is
/// still read and discarded.
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// How long to wait for the output pipes to close once the child is gone.
/// A grandchild that inherited the pipes can keep them open indefinitely.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Runs commands as child processes.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    max_output_bytes: usize,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ProcessRunner {
    /// Creates a runner that keeps at most `max_output_bytes` per stream.
    pub fn new(max_output_bytes: usize) -> Self {
        Self { max_output_bytes }
    }

    /// Creates a runner with the default output cap.
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_MAX_OUTPUT_BYTES)
    }

    pub fn max_output_bytes(&self) -> usize {
        self.max_output_bytes
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    fn name(&self) -> &str {
        "process"
    }

    async fn execute(
        &self,
        command: &CommandSpec,
        timeout: Duration,
    ) -> Result<ExecutionResult, RunnerError> {
        let program = command.program().ok_or(RunnerError::EmptyCommand)?;

        let mut cmd = Command::new(program);
        // `kill_on_drop` reclaims the child on every early return below.
        cmd.args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // The child leads a new process group so a timeout can take down
        // everything it started.
        #[cfg(unix)]
        cmd.process_group(0);

        let start = Instant::now();
        let mut child = cmd.spawn().map_err(|e| RunnerError::launch(program, e))?;
        let pid = child.id();

        debug!(program, pid, "Spawned command");

        let limit = self.max_output_bytes;
        let stdout_task = tokio::spawn(read_stream(child.stdout.take(), limit));
        let stderr_task = tokio::spawn(read_stream(child.stderr.take(), limit));

        let waited = tokio::time::timeout(timeout, child.wait()).await;
        let (exit_code, timed_out) = match waited {
            Ok(Ok(status)) => (status.code().unwrap_or(SIGNAL_EXIT_CODE), false),
            Ok(Err(source)) => {
                stdout_task.abort();
                stderr_task.abort();
                return Err(RunnerError::Io {
                    program: program.to_string(),
                    source,
                });
            }
            Err(_) => {
                warn!(
                    program,
                    timeout_ms = timeout.as_millis() as u64,
                    "Command timed out, killing process"
                );
                kill_process_group(pid, program);
                // kill() also reaps the child
                if let Err(e) = child.kill().await {
                    warn!(program, error = %e, "Failed to kill timed out process");
                }
                (TIMEOUT_EXIT_CODE, true)
            }
        };
        let duration = start.elapsed();

        let stdout = collect_stream(stdout_task).await;
        let stderr = collect_stream(stderr_task).await;

        debug!(
            program,
            exit_code,
            timed_out,
            duration_ms = duration.as_millis() as u64,
            "Command finished"
        );

        Ok(ExecutionResult {
            exit_code,
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            duration,
            timed_out,
        })
    }
}

/// Sends SIGKILL to the process group led by `pid`.
#[cfg(unix)]
fn kill_process_group(pid: Option<u32>, program: &str) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pid) = pid else { return };
    if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        warn!(program, pid, error = %e, "Failed to kill process group");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>, _program: &str) {}

/// Reads a stream to EOF, keeping at most `limit` bytes.
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>, limit: usize) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        let _ = (&mut h).take(limit as u64).read_to_end(&mut buf).await;
        let _ = tokio::io::copy(&mut h, &mut tokio::io::sink()).await;
    }
    buf
}

/// Waits for a reader task, abandoning it after `DRAIN_GRACE`.
async fn collect_stream(task: JoinHandle<Vec<u8>>) -> Vec<u8> {
    let abort = task.abort_handle();
    match tokio::time::timeout(DRAIN_GRACE, task).await {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(_)) => Vec::new(),
        Err(_) => {
            // Dropping the reader closes our end of the pipe.
            abort.abort();
            Vec::new()
        }
    }
}
