use std::sync::Arc;
use tengine_core::{Config, HealthProbe, SanitizedConfig, TransformExecutor};

/// Shared application state
pub struct AppState {
    config: Config,
    executor: Arc<TransformExecutor>,
    probe: Arc<HealthProbe>,
}

impl AppState {
    pub fn new(config: Config, executor: Arc<TransformExecutor>, probe: Arc<HealthProbe>) -> Self {
        Self {
            config,
            executor,
            probe,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn executor(&self) -> &TransformExecutor {
        self.executor.as_ref()
    }

    pub fn probe(&self) -> &HealthProbe {
        self.probe.as_ref()
    }
}
