use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use page_harvest::config::load_config;
///
/// let config = load_config(Path::new("harvest.toml")).unwrap();
/// println!("Template: {}", config.fetch.url_template);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so runs can be matched to the configuration they used.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&content);
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ArtifactBackend, RendererKind};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[fetch]
url-template = "https://example.com/items/{id}"
concurrency = 2
inter-request-delay = 500
max-retries = 4
backoff-base = 250
backoff-cap = 8000
render-timeout = 15000
cancel-grace = 1000

[renderer]
kind = "http"
user-agent = "TestHarvester/1.0"

[output]
backend = "sqlite"
database-path = "./test.db"

[profile]
path = "profiles/example.json"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.fetch.url_template, "https://example.com/items/{id}");
        assert_eq!(config.fetch.concurrency, 2);
        assert_eq!(config.fetch.inter_request_delay, 500);
        assert_eq!(config.fetch.max_retries, 4);
        assert_eq!(config.fetch.backoff_cap, 8000);
        assert_eq!(config.renderer.kind, RendererKind::Http);
        assert_eq!(
            config.renderer.user_agent.as_deref(),
            Some("TestHarvester/1.0")
        );
        assert_eq!(config.output.backend, ArtifactBackend::Sqlite);
        assert_eq!(config.output.database_path, "./test.db");
        assert_eq!(config.profile.path, "profiles/example.json");
    }

    #[test]
    fn test_defaults_applied() {
        let config = parse_config(
            r#"
[fetch]
url-template = "https://example.com/items/{id}"
"#,
        )
        .unwrap();

        assert_eq!(config.fetch.concurrency, 1);
        assert_eq!(config.fetch.inter_request_delay, 2000);
        assert_eq!(config.fetch.max_retries, 3);
        assert_eq!(config.fetch.render_timeout, 30_000);
        assert_eq!(config.renderer.kind, RendererKind::Http);
        assert!(config.renderer.headless);
        assert_eq!(config.output.backend, ArtifactBackend::Filesystem);
        assert_eq!(config.output.artifact_dir, "output");
        assert_eq!(config.profile.path, "site-profile.json");
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/harvest.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_fetch_section() {
        let result = parse_config("[output]\nartifact-dir = \"out\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[fetch]
url-template = "https://example.com/items/{id}"
concurrency = 0
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
