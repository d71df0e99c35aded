//! Trait definitions for the runner module.

use async_trait::async_trait;
use std::time::Duration;

use super::error::RunnerError;
use super::types::{CommandSpec, ExecutionResult};

/// Something that can execute a resolved command.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Returns the name of this runner implementation.
    fn name(&self) -> &str;

    /// Executes the command and waits for it to finish or time out.
    ///
    /// A timeout is reported as an `ExecutionResult` with `timed_out` set,
    /// not as an error. Errors are reserved for commands that never ran.
    async fn execute(
        &self,
        command: &CommandSpec,
        timeout: Duration,
    ) -> Result<ExecutionResult, RunnerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoRunner;

    #[async_trait]
    impl CommandRunner for EchoRunner {
        fn name(&self) -> &str {
            "echo"
        }

        async fn execute(
            &self,
            command: &CommandSpec,
            _timeout: Duration,
        ) -> Result<ExecutionResult, RunnerError> {
            if command.is_empty() {
                return Err(RunnerError::EmptyCommand);
            }
            Ok(ExecutionResult {
                exit_code: 0,
                stdout: command.args().join(" "),
                stderr: String::new(),
                duration: Duration::ZERO,
                timed_out: false,
            })
        }
    }

    #[tokio::test]
    async fn test_runner_as_trait_object() {
        let runner: Box<dyn CommandRunner> = Box::new(EchoRunner);
        let result = runner
            .execute(&CommandSpec::new(["echo", "hello"]), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(runner.name(), "echo");
        assert_eq!(result.stdout, "hello");
    }

    #[tokio::test]
    async fn test_runner_rejects_empty_command() {
        let result = EchoRunner
            .execute(&CommandSpec::new(Vec::<String>::new()), Duration::from_secs(1))
            .await;
        assert!(matches!(result, Err(RunnerError::EmptyCommand)));
    }
}
