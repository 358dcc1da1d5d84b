//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that every setting the engine requires is present
//! - Validate URIs, addresses and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::ServerConfig;
use crate::observability::logging::parse_level;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let context_path = &config.context_path;
    if !context_path.is_empty() && (!context_path.starts_with('/') || context_path.ends_with('/')) {
        errors.push(ValidationError::new(
            "context_path",
            "must be empty or start with '/' and not end with '/'",
        ));
    }

    if config.environment.is_empty() {
        errors.push(ValidationError::new("environment", "must not be empty"));
    }

    if parse_level(&config.log_level).is_none() {
        errors.push(ValidationError::new(
            "log_level",
            format!("unknown level '{}'", config.log_level),
        ));
    }

    require(&mut errors, "jwt_public_key", &config.jwt_public_key);
    require_url(&mut errors, "mongodb.uri", &config.mongodb.uri);
    require(&mut errors, "mongodb.database", &config.mongodb.database);
    require_url(&mut errors, "fanout.uri", &config.fanout.uri);
    require(&mut errors, "fanout.secret", &config.fanout.secret);
    require_url(&mut errors, "engine.uri", &config.engine.uri);

    if let Some(elastic) = &config.elastic_log {
        require_url(&mut errors, "elastic_log.uri", &elastic.uri);
        require(
            &mut errors,
            "elastic_log.authorization_header",
            &elastic.authorization_header,
        );
    }

    if config.listener.host.is_empty() {
        errors.push(ValidationError::new("listener.host", "must not be empty"));
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::new("limits.max_body_bytes", "must be positive"));
    }

    if config.timeouts.engine_secs == 0 {
        errors.push(ValidationError::new("timeouts.engine_secs", "must be positive"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn require(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.push(ValidationError::new(field, "is required"));
    }
}

fn require_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.push(ValidationError::new(field, "is required"));
    } else if let Err(e) = Url::parse(value) {
        errors.push(ValidationError::new(field, format!("invalid URI: {e}")));
    }
}
