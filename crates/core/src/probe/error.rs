//! Error types for the probe module.

use std::path::PathBuf;
use thiserror::Error;

use crate::transform::TransformError;

/// Reasons a probe run counts as failed.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The fixture could not be read.
    #[error("Probe source unavailable at {path}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The fixture is smaller than the configured minimum.
    #[error("Probe source is {actual} bytes, expected at least {minimum}")]
    SourceTooSmall { actual: u64, minimum: u64 },

    /// The per-run work directory could not be prepared.
    #[error("Failed to prepare probe work directory {path}: {source}")]
    WorkDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The probe transform itself failed.
    #[error("Probe transform failed: {0}")]
    Transform(#[from] TransformError),

    /// The probe output size is outside the expected range.
    #[error("Probe output is {actual} bytes, expected {expected} +/- {tolerance}")]
    UnexpectedTargetSize {
        actual: u64,
        expected: u64,
        tolerance: u64,
    },
}
