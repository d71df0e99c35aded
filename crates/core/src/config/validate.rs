use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Transform timeout is not 0
/// - At least one command, none of them empty
/// - Probe thresholds are consistent
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.server.max_upload_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "server.max_upload_bytes cannot be 0".to_string(),
        ));
    }

    // Transformer validation
    if config.transformer.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "transformer.timeout_secs cannot be 0".to_string(),
        ));
    }
    if config.transformer.commands.is_empty() {
        return Err(ConfigError::ValidationError(
            "transformer.commands must define at least one command".to_string(),
        ));
    }
    if let Some((name, _)) = config
        .transformer
        .commands
        .iter()
        .find(|(_, template)| template.is_empty())
    {
        return Err(ConfigError::ValidationError(format!(
            "transformer.commands.\"{}\" is empty",
            name
        )));
    }

    // Probe validation
    config.probe.validate().map_err(ConfigError::ValidationError)?;
    if !config.transformer.commands.supports(&config.probe.transform_name) {
        return Err(ConfigError::ValidationError(format!(
            "no command configured for probe transform '{}'",
            config.probe.transform_name
        )));
    }

    Ok(())
}
