pub mod config;
pub mod metrics;
pub mod probe;
pub mod runner;
pub mod testing;
pub mod transform;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
    ServerConfig, TransformerConfig,
};
pub use probe::{HealthProbe, ProbeConfig, ProbeError, ProbeSnapshot, ReadinessState};
pub use runner::{CommandRunner, CommandSpec, ExecutionResult, ProcessRunner, RunnerError};
pub use transform::{
    CommandTable, StatusHint, TransformError, TransformExecutor, TransformReport,
    TransformRequest,
};
