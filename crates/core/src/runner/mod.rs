//! Runner module for executing external command-line tools.
//!
//! This module provides the `CommandRunner` trait and the `ProcessRunner`
//! implementation, which spawns one child process per call, drains its
//! output streams and enforces a wall-clock timeout.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use tengine_core::runner::{CommandRunner, CommandSpec, ProcessRunner};
//!
//! let runner = ProcessRunner::with_defaults();
//! let command = CommandSpec::new(["ffmpeg", "-version"]);
//!
//! let result = runner.execute(&command, Duration::from_secs(10)).await?;
//! println!("exit code {} in {:?}", result.exit_code, result.duration);
//! ```

mod error;
mod process;
mod traits;
mod types;

pub use error::RunnerError;
pub use process::{ProcessRunner, DEFAULT_MAX_OUTPUT_BYTES};
pub use traits::CommandRunner;
pub use types::{CommandSpec, ExecutionResult, SIGNAL_EXIT_CODE, TIMEOUT_EXIT_CODE};
