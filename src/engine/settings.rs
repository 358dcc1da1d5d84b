//! Engine construction settings.
//!
//! Everything the engine needs from configuration, gathered in one value so
//! engines can be built without depending on the config schema. The
//! serialized form is what a remote engine receives when it is configured.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::config::ServerConfig;

/// Settings an engine is constructed from.
#[derive(Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSettings {
    pub context_path: String,
    pub environment: String,
    pub audit_topic: String,
    pub breaking_the_glass: bool,
    pub jwt_public_key: String,
    pub kafka: BTreeMap<String, String>,
    pub mongo_uri: String,
    pub mongo_database: String,
    pub fanout_uri: String,
    pub fanout_secret: String,
    #[serde(skip)]
    pub engine_uri: String,
}

impl EngineSettings {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            context_path: config.context_path.clone(),
            environment: config.environment.clone(),
            audit_topic: config.audit_topic(),
            breaking_the_glass: true,
            jwt_public_key: config.jwt_public_key.clone(),
            kafka: config
                .kafka
                .iter()
                .map(|(key, value)| (key.clone(), kafka_value(value)))
                .collect(),
            mongo_uri: config.mongodb.uri.clone(),
            mongo_database: config.mongodb.database.clone(),
            fanout_uri: config.fanout.uri.clone(),
            fanout_secret: config.fanout.secret.clone(),
            engine_uri: config.engine.uri.clone(),
        }
    }
}

// Kafka properties are strings on the client side.
fn kafka_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl fmt::Debug for EngineSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineSettings")
            .field("context_path", &self.context_path)
            .field("environment", &self.environment)
            .field("audit_topic", &self.audit_topic)
            .field("breaking_the_glass", &self.breaking_the_glass)
            .field("jwt_public_key", &"<redacted>")
            .field("kafka", &self.kafka.keys().collect::<Vec<_>>())
            .field("mongo_uri", &self.mongo_uri)
            .field("mongo_database", &self.mongo_database)
            .field("fanout_uri", &self.fanout_uri)
            .field("fanout_secret", &"<redacted>")
            .field("engine_uri", &self.engine_uri)
            .finish()
    }
}
