use crate::config::types::{
    ArtifactBackend, Config, FetchConfig, OutputConfig, ProfileConfig, RendererConfig,
    RendererKind,
};
use crate::item::UrlTemplate;
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetch_config(&config.fetch)?;
    validate_renderer_config(&config.renderer)?;
    validate_output_config(&config.output)?;
    validate_profile_config(&config.profile)?;
    Ok(())
}

/// Validates batch fetch tuning
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    UrlTemplate::new(config.url_template.as_str())
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid url-template: {}", e)))?;

    if config.concurrency < 1 || config.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 100, got {}",
            config.concurrency
        )));
    }

    if config.max_retries > 20 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be <= 20, got {}",
            config.max_retries
        )));
    }

    if config.backoff_cap < config.backoff_base {
        return Err(ConfigError::Validation(format!(
            "backoff-cap ({}ms) must be >= backoff-base ({}ms)",
            config.backoff_cap, config.backoff_base
        )));
    }

    if config.render_timeout < 1000 {
        return Err(ConfigError::Validation(format!(
            "render-timeout must be >= 1000ms, got {}ms",
            config.render_timeout
        )));
    }

    Ok(())
}

/// Validates renderer configuration
fn validate_renderer_config(config: &RendererConfig) -> Result<(), ConfigError> {
    if config
        .user_agent
        .as_deref()
        .is_some_and(|ua| ua.trim().is_empty())
    {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.kind == RendererKind::Chrome && !cfg!(feature = "chrome") {
        return Err(ConfigError::Validation(
            "renderer kind 'chrome' requires building with the `chrome` feature".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    match config.backend {
        ArtifactBackend::Filesystem if config.artifact_dir.is_empty() => Err(
            ConfigError::Validation("artifact-dir cannot be empty".to_string()),
        ),
        ArtifactBackend::Sqlite if config.database_path.is_empty() => Err(
            ConfigError::Validation("database-path cannot be empty".to_string()),
        ),
        _ => Ok(()),
    }
}

/// Validates profile configuration
fn validate_profile_config(config: &ProfileConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "profile path cannot be empty".to_string(),
        ));
    }
    Ok(())
}
