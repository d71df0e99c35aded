//! Classification of execution results.

use std::path::Path;

use crate::runner::ExecutionResult;

use super::types::TransformOutcome;

/// Message used when the tool left no usable output file.
pub const MISSING_OUTPUT_MESSAGE: &str = "transformer failed to create an output file";

/// Decides whether an execution produced a usable target file.
///
/// Rules, in order:
/// 1. A timed out execution is a server error.
/// 2. A non-zero exit with diagnostic stderr is a client error carrying that text.
/// 3. A missing or empty target file is a server error.
/// 4. Anything else is a success. A non-zero exit without stderr is ambiguous,
///    so the output file decides.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultValidator;

impl ResultValidator {
    pub async fn validate(result: &ExecutionResult, target_path: &Path) -> TransformOutcome {
        if result.timed_out {
            return TransformOutcome::ServerError {
                message: format!("transformer timed out after {} ms", result.duration_ms()),
            };
        }

        if result.exit_code != 0 && !result.stderr.is_empty() {
            return TransformOutcome::ClientError {
                message: result.stderr.trim_end().to_string(),
            };
        }

        match tokio::fs::metadata(target_path).await {
            Ok(meta) if meta.is_file() && meta.len() > 0 => TransformOutcome::Success {
                target_size_bytes: meta.len(),
            },
            _ => TransformOutcome::ServerError {
                message: MISSING_OUTPUT_MESSAGE.to_string(),
            },
        }
    }
}
