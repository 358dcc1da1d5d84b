//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Path prefix under which the engine is exposed (e.g., "/api").
    pub context_path: String,

    /// Environment name; also selects the audit topic.
    pub environment: String,

    /// Log level, either a tracing level or a java.util.logging level name.
    pub log_level: String,

    /// Public key the engine uses to verify bearer tokens.
    pub jwt_public_key: String,

    /// Kafka client properties handed to the engine as-is.
    pub kafka: BTreeMap<String, toml::Value>,

    /// Document store settings.
    pub mongodb: MongoConfig,

    /// Fan-out service settings.
    pub fanout: FanoutConfig,

    /// Engine endpoint settings.
    pub engine: EngineConfig,

    /// Optional log shipping to Elasticsearch.
    pub elastic_log: Option<ElasticLogConfig>,

    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Request limits.
    pub limits: LimitsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            context_path: String::new(),
            environment: "dev".to_string(),
            log_level: "INFO".to_string(),
            jwt_public_key: String::new(),
            kafka: BTreeMap::new(),
            mongodb: MongoConfig::default(),
            fanout: FanoutConfig::default(),
            engine: EngineConfig::default(),
            elastic_log: None,
            listener: ListenerConfig::default(),
            limits: LimitsConfig::default(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Name of the topic the engine writes audit records to.
    pub fn audit_topic(&self) -> String {
        format!("audit-{}", self.environment)
    }
}

/// MongoDB configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

/// Fan-out configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FanoutConfig {
    pub uri: String,
    pub secret: String,
}

/// Remote engine configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Endpoint that receives translated requests.
    pub uri: String,
}

/// Elasticsearch log shipping configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ElasticLogConfig {
    /// Document endpoint, e.g. "https://elastic:9200/logs/_doc".
    pub uri: String,

    /// Value of the Authorization header sent with every document.
    pub authorization_header: String,
}

/// Listener configuration. The port comes from the command line.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host or address to bind.
    pub host: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Largest request body decoded as JSON; larger bodies are ignored.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Maximum time to wait for the engine's response.
    pub engine_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { engine_secs: 60 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Prometheus exporter bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
