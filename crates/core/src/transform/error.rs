//! Error types for the transform module.

use serde::Serialize;
use thiserror::Error;

use crate::runner::RunnerError;

use super::commands::CommandError;

/// HTTP status the hosting layer should use for a failed transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusHint {
    /// The caller's input caused the failure (4xx).
    BadRequest,
    /// The service failed (5xx).
    InternalError,
}

impl StatusHint {
    /// Numeric HTTP status code.
    pub fn as_u16(self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::InternalError => 500,
        }
    }
}

/// The single failure type surfaced by `TransformExecutor::run`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransformError {
    pub status: StatusHint,
    pub message: String,
}

impl TransformError {
    /// Creates a client-caused error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusHint::BadRequest,
            message: message.into(),
        }
    }

    /// Creates a server-caused error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusHint::InternalError,
            message: message.into(),
        }
    }

    pub fn is_bad_request(&self) -> bool {
        self.status == StatusHint::BadRequest
    }
}

impl From<CommandError> for TransformError {
    fn from(err: CommandError) -> Self {
        Self::internal(err.to_string())
    }
}

impl From<RunnerError> for TransformError {
    fn from(err: RunnerError) -> Self {
        Self::internal(err.to_string())
    }
}

impl From<std::io::Error> for TransformError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(format!("I/O error: {}", err))
    }
}
