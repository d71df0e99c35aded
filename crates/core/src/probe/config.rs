//! Configuration for the health probe.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the self-test transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Fixture file transformed by every probe. Never modified.
    #[serde(default = "default_source_path")]
    pub source_path: PathBuf,

    /// File name of the probe output inside the per-run directory.
    #[serde(default = "default_target_file_name")]
    pub target_file_name: String,

    /// Transform name used for the probe request.
    #[serde(default = "default_transform_name")]
    pub transform_name: String,

    #[serde(default = "default_source_mimetype")]
    pub source_mimetype: String,

    #[serde(default = "default_target_mimetype")]
    pub target_mimetype: String,

    /// Fixed transform options for the probe request.
    #[serde(default = "default_options")]
    pub options: HashMap<String, String>,

    /// Typical probe duration in milliseconds.
    #[serde(default = "default_expected_time")]
    pub expected_time_ms: u64,

    /// Probes slower than this are logged as slow. They are not failed.
    #[serde(default = "default_max_time")]
    pub max_time_ms: u64,

    /// Probes slower than this are logged at info level, faster ones at debug.
    #[serde(default = "default_logging_threshold")]
    pub response_time_logging_threshold_ms: u64,

    /// The fixture must be at least this large or the probe fails without running.
    #[serde(default = "default_min_source_size")]
    pub min_expected_source_file_size_bytes: u64,

    /// Consecutive passing probes needed to report ready.
    #[serde(default = "default_min_consecutive")]
    pub min_consecutive_transforms_before_liveness_check: u32,

    /// Consecutive failing probes that make the engine unready.
    #[serde(default = "default_max_failures")]
    pub max_consecutive_failures_before_unready: u32,

    /// Expected size of the probe output, if it should be checked.
    ///
    /// Unset by default: what the shipped ffmpeg command produces for the
    /// fixture varies with the ffmpeg build and its fonts, so a fixed value
    /// would fail probes on hosts where the transform works. Set it once the
    /// output size of the deployed build is known.
    #[serde(default)]
    pub expected_target_size_bytes: Option<u64>,

    /// Allowed deviation from `expected_target_size_bytes`.
    #[serde(default = "default_size_tolerance")]
    pub target_size_tolerance_bytes: u64,

    /// Scheduler period. Also how long a probe result is reused by readiness checks.
    #[serde(default = "default_interval")]
    pub interval_ms: u64,

    /// Directory for per-run probe outputs.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
}

fn default_source_path() -> PathBuf {
    PathBuf::from("fixtures/probe_test.txt")
}

fn default_target_file_name() -> String {
    "probe_test.mp4".to_string()
}

fn default_transform_name() -> String {
    "helloWorld".to_string()
}

fn default_source_mimetype() -> String {
    "text/plain".to_string()
}

fn default_target_mimetype() -> String {
    "video/mp4".to_string()
}

fn default_options() -> HashMap<String, String> {
    HashMap::from([("language".to_string(), "Spanish".to_string())])
}

fn default_expected_time() -> u64 {
    1000
}

fn default_max_time() -> u64 {
    20_000
}

fn default_logging_threshold() -> u64 {
    150
}

fn default_min_source_size() -> u64 {
    8
}

fn default_min_consecutive() -> u32 {
    1
}

fn default_max_failures() -> u32 {
    1
}

fn default_size_tolerance() -> u64 {
    20
}

fn default_interval() -> u64 {
    10_000 // 10 seconds
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("tengine-probe")
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            source_path: default_source_path(),
            target_file_name: default_target_file_name(),
            transform_name: default_transform_name(),
            source_mimetype: default_source_mimetype(),
            target_mimetype: default_target_mimetype(),
            options: default_options(),
            expected_time_ms: default_expected_time(),
            max_time_ms: default_max_time(),
            response_time_logging_threshold_ms: default_logging_threshold(),
            min_expected_source_file_size_bytes: default_min_source_size(),
            min_consecutive_transforms_before_liveness_check: default_min_consecutive(),
            max_consecutive_failures_before_unready: default_max_failures(),
            expected_target_size_bytes: None,
            target_size_tolerance_bytes: default_size_tolerance(),
            interval_ms: default_interval(),
            work_dir: default_work_dir(),
        }
    }
}

impl ProbeConfig {
    /// Sets the readiness thresholds.
    pub fn with_thresholds(mut self, min_consecutive: u32, max_failures: u32) -> Self {
        self.min_consecutive_transforms_before_liveness_check = min_consecutive;
        self.max_consecutive_failures_before_unready = max_failures;
        self
    }

    /// Sets the expected and maximum probe times.
    pub fn with_times(mut self, expected_time_ms: u64, max_time_ms: u64) -> Self {
        self.expected_time_ms = expected_time_ms;
        self.max_time_ms = max_time_ms;
        self
    }

    /// Scheduler period, never zero.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }

    /// Checks the invariants between thresholds.
    pub fn validate(&self) -> Result<(), String> {
        if self.expected_time_ms > self.max_time_ms {
            return Err(format!(
                "probe.expected_time_ms ({}) must not exceed probe.max_time_ms ({})",
                self.expected_time_ms, self.max_time_ms
            ));
        }
        if self.min_consecutive_transforms_before_liveness_check == 0 {
            return Err(
                "probe.min_consecutive_transforms_before_liveness_check must be at least 1"
                    .to_string(),
            );
        }
        if self.max_consecutive_failures_before_unready == 0 {
            return Err("probe.max_consecutive_failures_before_unready must be at least 1".to_string());
        }
        if self.interval_ms == 0 {
            return Err("probe.interval_ms cannot be 0".to_string());
        }
        if self.target_file_name.is_empty() || self.target_file_name.contains(['/', '\\']) {
            return Err(format!(
                "probe.target_file_name must be a plain file name, got '{}'",
                self.target_file_name
            ));
        }
        Ok(())
    }
}
