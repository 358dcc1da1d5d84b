//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ServerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ServerConfig, ConfigError> {
    let config: ServerConfig = toml::from_str(content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        jwt_public_key = "key"

        [mongodb]
        uri = "mongodb://localhost:27017"
        database = "es"

        [fanout]
        uri = "https://fanout.example.com"
        secret = "s3cret"

        [engine]
        uri = "http://localhost:9000/engine"
    "#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse_config(MINIMAL).unwrap();

        assert_eq!(config.context_path, "");
        assert_eq!(config.environment, "dev");
        assert_eq!(config.log_level, "INFO");
        assert_eq!(config.audit_topic(), "audit-dev");
        assert_eq!(config.listener.host, "0.0.0.0");
        assert_eq!(config.timeouts.engine_secs, 60);
        assert!(config.elastic_log.is_none());
        assert!(config.kafka.is_empty());
    }

    #[test]
    fn test_full_config() {
        let content = format!(
            r#"
            context_path = "/api"
            environment = "prod"
            log_level = "SEVERE"
            {MINIMAL}

            [kafka]
            "bootstrap.servers" = "localhost:9092"
            "num.stream.threads" = 4

            [elastic_log]
            uri = "https://elastic.example.com/logs/_doc"
            authorization_header = "Basic abc"
            "#
        );

        let config = parse_config(&content).unwrap();

        assert_eq!(config.context_path, "/api");
        assert_eq!(config.audit_topic(), "audit-prod");
        assert_eq!(
            config.kafka.get("bootstrap.servers").and_then(|v| v.as_str()),
            Some("localhost:9092")
        );
        assert_eq!(
            config.elastic_log.map(|e| e.authorization_header).as_deref(),
            Some("Basic abc")
        );
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("context_path = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_error_lists_every_problem() {
        let err = parse_config("context_path = \"api/\"").unwrap_err();

        match err {
            ConfigError::Validation(errors) => assert!(errors.len() > 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
