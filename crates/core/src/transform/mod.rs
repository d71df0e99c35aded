//! Transform module: resolves a request to a command, runs it and
//! classifies the result.
//!
//! `TransformExecutor::run` is the single boundary callers see. Command
//! resolution errors, launch failures, I/O errors and panics are all
//! normalized into one `TransformError` carrying a `StatusHint`.

mod commands;
mod error;
mod executor;
mod types;
mod validator;

pub use commands::{CommandError, CommandTable, WILDCARD};
pub use error::{StatusHint, TransformError};
pub use executor::TransformExecutor;
pub use types::{TransformOutcome, TransformReport, TransformRequest};
pub use validator::{ResultValidator, MISSING_OUTPUT_MESSAGE};
