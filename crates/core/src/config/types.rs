use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use crate::probe::ProbeConfig;
use crate::runner::DEFAULT_MAX_OUTPUT_BYTES;
use crate::transform::{CommandTable, WILDCARD};

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub transformer: TransformerConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest accepted transform upload (whole multipart body).
    #[serde(default = "default_max_upload")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8090
}

fn default_max_upload() -> usize {
    256 * 1024 * 1024
}

/// Transformer configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransformerConfig {
    /// Display name, reported by the version endpoint.
    #[serde(default = "default_name")]
    pub name: String,
    /// Timeout for a single transform command in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Maximum bytes of stdout/stderr kept per command.
    #[serde(default = "default_max_output")]
    pub max_output_bytes: usize,
    /// Directory for uploaded sources and produced targets.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
    /// Transform name to command template; `"*"` is the fallback.
    #[serde(default = "default_commands")]
    pub commands: CommandTable,
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            timeout_secs: default_timeout(),
            max_output_bytes: default_max_output(),
            work_dir: default_work_dir(),
            commands: default_commands(),
        }
    }
}

impl TransformerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Version string reported to clients.
    pub fn version(&self) -> String {
        format!("{} available", self.name)
    }
}

fn default_name() -> String {
    "Hello World Transformer".to_string()
}

fn default_timeout() -> u64 {
    120
}

fn default_max_output() -> usize {
    DEFAULT_MAX_OUTPUT_BYTES
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("tengine")
}

/// Renders the source file name onto a short blue video.
fn default_commands() -> CommandTable {
    CommandTable::new().with_command(
        WILDCARD,
        [
            "ffmpeg",
            "-y",
            "-f",
            "lavfi",
            "-i",
            "color=size=320x240:duration=10:rate=25:color=blue",
            "-vf",
            "drawtext=fontsize=30:fontcolor=white:x=(w-text_w)/2:y=(h-text_h)/2:text='{source}'",
            "{target}",
        ],
    )
}

/// Sanitized config for API responses (command templates hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub transformer: SanitizedTransformerConfig,
    pub probe: SanitizedProbeConfig,
}

/// Transformer config without command arguments
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTransformerConfig {
    pub name: String,
    pub timeout_secs: u64,
    pub work_dir: PathBuf,
    /// Configured transform names, `"*"` included.
    pub transforms: Vec<String>,
}

/// Probe thresholds
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedProbeConfig {
    pub transform_name: String,
    pub expected_time_ms: u64,
    pub max_time_ms: u64,
    pub min_consecutive_transforms_before_liveness_check: u32,
    pub max_consecutive_failures_before_unready: u32,
    pub interval_ms: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            transformer: SanitizedTransformerConfig {
                name: config.transformer.name.clone(),
                timeout_secs: config.transformer.timeout_secs,
                work_dir: config.transformer.work_dir.clone(),
                transforms: config
                    .transformer
                    .commands
                    .names()
                    .map(str::to_string)
                    .collect(),
            },
            probe: SanitizedProbeConfig {
                transform_name: config.probe.transform_name.clone(),
                expected_time_ms: config.probe.expected_time_ms,
                max_time_ms: config.probe.max_time_ms,
                min_consecutive_transforms_before_liveness_check: config
                    .probe
                    .min_consecutive_transforms_before_liveness_check,
                max_consecutive_failures_before_unready: config
                    .probe
                    .max_consecutive_failures_before_unready,
                interval_ms: config.probe.interval_ms,
            },
        }
    }
}
