//! Error types for the runner module.

use thiserror::Error;

/// Errors that prevent a command from producing an execution result.
///
/// A command that starts and then fails (non-zero exit, timeout) is not an
/// error at this level; it is reported through `ExecutionResult`.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The command has no program token.
    #[error("Command is empty")]
    EmptyCommand,

    /// The program could not be started (missing binary, permission denied).
    #[error("Failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on the child process failed.
    #[error("I/O error while waiting for '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl RunnerError {
    /// Creates a launch error for the given program.
    pub fn launch(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::Launch {
            program: program.into(),
            source,
        }
    }

    /// Whether the program binary was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Launch { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_launch_not_found() {
        let err = RunnerError::launch("ffmpeg", Error::new(ErrorKind::NotFound, "no such file"));
        assert!(err.is_not_found());
        assert!(err.to_string().contains("ffmpeg"));
    }

    #[test]
    fn test_permission_denied_is_not_not_found() {
        let err = RunnerError::launch("tool", Error::new(ErrorKind::PermissionDenied, "denied"));
        assert!(!err.is_not_found());
        assert!(!RunnerError::EmptyCommand.is_not_found());
    }
}
