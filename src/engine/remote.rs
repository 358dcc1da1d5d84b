//! Engine reached over HTTP.
//!
//! # Wire Format
//! ```text
//! POST <engine.uri>/configure            once, before the first request
//!     {"contextPath": .., "environment": .., "auditTopic": .., "jwtPublicKey": ..,
//!      "kafka": {..}, "mongoUri": .., "fanoutUri": .., "fanoutSecret": .., ..}
//!
//! POST <engine.uri>
//!     x-jes-environment: <environment>
//!     x-jes-audit-topic: <audit topic>
//!     {"method": .., "path": .., "queryString": .., "headers": {..}, "body": ..}
//!
//! 2xx {"statusCode": 200, "headers": {"name": ["value"]}, "body": <json>}
//! ```
//!
//! # Design Decisions
//! - One pooled `reqwest::Client` shared by all requests
//! - Timeouts are applied by the dispatcher, not here
//! - A failed configure call is retried on the next request
//! - Collections (`GET <contextPath>/<app>/<type>`) return multiple values

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::engine::{
    Engine, EngineError, EngineRequest, EngineResponse, EngineSettings, Headers, JsonBody,
};

const ENVIRONMENT_HEADER: &str = "x-jes-environment";
const AUDIT_TOPIC_HEADER: &str = "x-jes-audit-topic";

/// Reply envelope returned by the remote engine.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteReply {
    status_code: u16,
    #[serde(default)]
    headers: Option<Headers>,
    #[serde(default)]
    body: Option<Value>,
}

impl RemoteReply {
    fn into_response(self, multiple: bool) -> EngineResponse {
        let body = self.body.map(|body| match body {
            Value::Array(values) if multiple => JsonBody::from_values(values),
            other => JsonBody::single(other),
        });

        EngineResponse {
            status_code: self.status_code,
            headers: self.headers,
            body,
        }
    }
}

/// Engine client forwarding translated requests to a remote engine.
pub struct RemoteEngine {
    client: reqwest::Client,
    settings: EngineSettings,
    configure_uri: String,
    configured: OnceCell<()>,
}

impl RemoteEngine {
    pub fn new(settings: EngineSettings) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| EngineError::Unavailable(e.to_string()))?;

        Ok(Self::with_client(settings, client))
    }

    pub fn with_client(settings: EngineSettings, client: reqwest::Client) -> Self {
        tracing::info!(
            endpoint = %settings.engine_uri,
            environment = %settings.environment,
            audit_topic = %settings.audit_topic,
            "Remote engine client created"
        );

        let configure_uri = format!("{}/configure", settings.engine_uri.trim_end_matches('/'));

        Self {
            client,
            settings,
            configure_uri,
            configured: OnceCell::new(),
        }
    }

    /// Deliver the engine settings unless that already succeeded.
    async fn ensure_configured(&self) -> Result<(), EngineError> {
        self.configured
            .get_or_try_init(|| async {
                self.client
                    .post(&self.configure_uri)
                    .json(&self.settings)
                    .send()
                    .await
                    .and_then(|response| response.error_for_status())
                    .map_err(|e| EngineError::Unavailable(e.to_string()))?;

                tracing::info!(endpoint = %self.configure_uri, "Remote engine configured");
                Ok::<_, EngineError>(())
            })
            .await
            .map(|_| ())
    }

    fn is_collection(&self, path: &str) -> bool {
        let Some(rest) = path.strip_prefix(self.settings.context_path.as_str()) else {
            return false;
        };

        rest.starts_with('/') && rest.split('/').filter(|s| !s.is_empty()).count() == 2
    }
}

#[async_trait]
impl Engine for RemoteEngine {
    fn returns_multiple(&self, request: &EngineRequest) -> bool {
        request.method.eq_ignore_ascii_case("GET") && self.is_collection(&request.path)
    }

    async fn process(&self, request: &EngineRequest) -> Result<EngineResponse, EngineError> {
        self.ensure_configured().await?;
        let multiple = self.returns_multiple(request);

        let reply = self
            .client
            .post(&self.settings.engine_uri)
            .header(ENVIRONMENT_HEADER, &self.settings.environment)
            .header(AUDIT_TOPIC_HEADER, &self.settings.audit_topic)
            .json(request)
            .send()
            .await
            .map_err(|e| EngineError::Unavailable(e.to_string()))?;

        let status = reply.status();
        if !status.is_success() {
            return Err(EngineError::Rejected(status.as_u16()));
        }

        let reply: RemoteReply = reply
            .json()
            .await
            .map_err(|e| EngineError::Protocol(e.to_string()))?;

        tracing::debug!(
            path = %request.path,
            status = reply.status_code,
            multiple,
            "Engine replied"
        );

        Ok(reply.into_response(multiple))
    }
}
