//! Testing utilities and mock implementations.
//!
//! This module provides a mock implementation of the `CommandRunner` trait,
//! allowing executor and health probe tests without real external tools.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tengine_core::testing::MockRunner;
//! use tengine_core::transform::{CommandTable, TransformExecutor, WILDCARD};
//!
//! let runner = Arc::new(MockRunner::new());
//! runner.write_target_on_success(b"output".to_vec()).await;
//!
//! let commands = CommandTable::new().with_command(WILDCARD, ["tool", "{target}"]);
//! let executor = TransformExecutor::new(commands, runner.clone(), Duration::from_secs(5));
//! ```

mod mock_runner;

pub use mock_runner::{MockRunner, ScriptedRun};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::{Path, PathBuf};

    use crate::probe::ProbeConfig;
    use crate::transform::TransformRequest;

    /// Content of the probe source fixture used in tests (10 bytes).
    pub const PROBE_SOURCE: &[u8] = b"Probe Test";

    /// Write the probe source fixture into `dir` and return its path.
    pub fn write_probe_source(dir: &Path) -> std::io::Result<PathBuf> {
        let path = dir.join("probe_test.txt");
        std::fs::write(&path, PROBE_SOURCE)?;
        Ok(path)
    }

    /// A probe config pointing at fixtures inside `dir`, with fast thresholds.
    pub fn probe_config(dir: &Path) -> std::io::Result<ProbeConfig> {
        let source_path = write_probe_source(dir)?;
        Ok(ProbeConfig {
            source_path,
            work_dir: dir.join("probe-work"),
            interval_ms: 50,
            ..ProbeConfig::default()
        })
    }

    /// The hello world request used throughout the tests.
    pub fn hello_world_request(source: &Path, target: &Path) -> TransformRequest {
        TransformRequest::new("helloWorld", source, target)
            .with_mimetypes("text/plain", "video/mp4")
            .with_option("language", "Spanish")
    }
}
