//! Transform orchestration.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::metrics::{TRANSFORMS_TOTAL, TRANSFORM_DURATION, TRANSFORM_TIMEOUTS};
use crate::runner::CommandRunner;

use super::commands::CommandTable;
use super::error::{StatusHint, TransformError};
use super::types::{TransformOutcome, TransformReport, TransformRequest};
use super::validator::ResultValidator;

/// Metric label for names no command serves.
const UNKNOWN_LABEL: &str = "unknown";

/// Runs transform requests through the configured commands.
///
/// Every failure, including a panic inside the orchestration, comes back as a
/// `TransformError`. On failure the target file may be partially written and
/// must be discarded by the caller.
pub struct TransformExecutor {
    commands: CommandTable,
    runner: Arc<dyn CommandRunner>,
    timeout: Duration,
}

impl TransformExecutor {
    pub fn new(commands: CommandTable, runner: Arc<dyn CommandRunner>, timeout: Duration) -> Self {
        Self {
            commands,
            runner,
            timeout,
        }
    }

    pub fn commands(&self) -> &CommandTable {
        &self.commands
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn runner_name(&self) -> &str {
        self.runner.name()
    }

    /// Runs one transform to completion.
    pub async fn run(&self, request: &TransformRequest) -> Result<TransformReport, TransformError> {
        let start = Instant::now();

        let result = match AssertUnwindSafe(self.execute(request, start))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(_) => Err(TransformError::internal(
                "There was a problem during transformation: internal panic",
            )),
        };

        let elapsed = start.elapsed();
        let label = self.metric_label(request);
        let outcome = match &result {
            Ok(_) => "success",
            Err(e) if e.status == StatusHint::BadRequest => "client_error",
            Err(_) => "server_error",
        };
        TRANSFORMS_TOTAL
            .with_label_values(&[label, outcome])
            .inc();
        TRANSFORM_DURATION
            .with_label_values(&[outcome])
            .observe(elapsed.as_secs_f64());

        match &result {
            Ok(report) => info!(
                transform = %request.transform_name,
                elapsed_ms = report.elapsed_ms,
                target_size_bytes = report.target_size_bytes,
                "Transform completed"
            ),
            Err(e) => warn!(
                transform = %request.transform_name,
                elapsed_ms = elapsed.as_millis() as u64,
                status = e.status.as_u16(),
                error = %e,
                "Transform failed"
            ),
        }

        result
    }

    /// Metric label for a request. Names come from callers, so only
    /// configured table keys are used as labels.
    fn metric_label<'a>(&'a self, request: &'a TransformRequest) -> &'a str {
        self.commands
            .matched_key(&request.transform_name)
            .unwrap_or(UNKNOWN_LABEL)
    }

    async fn execute(
        &self,
        request: &TransformRequest,
        start: Instant,
    ) -> Result<TransformReport, TransformError> {
        let command = self.commands.resolve(request)?;

        if let Some(parent) = request.target_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        debug!(
            transform = %request.transform_name,
            command = %command,
            timeout_ms = self.timeout.as_millis() as u64,
            "Executing transform command"
        );

        let result = self.runner.execute(&command, self.timeout).await?;
        if result.timed_out {
            TRANSFORM_TIMEOUTS
                .with_label_values(&[self.metric_label(request)])
                .inc();
        }

        match ResultValidator::validate(&result, &request.target_path).await {
            TransformOutcome::Success { target_size_bytes } => Ok(TransformReport {
                transform_name: request.transform_name.clone(),
                target_size_bytes,
                elapsed_ms: start.elapsed().as_millis() as u64,
            }),
            TransformOutcome::ClientError { message } => Err(TransformError::bad_request(message)),
            TransformOutcome::ServerError { message } => Err(TransformError::internal(message)),
        }
    }
}
