//! Log shipping to Elasticsearch.
//!
//! Events at or above the configured level become JSON documents that a
//! background task POSTs to the configured endpoint. The subscriber side
//! never blocks: documents go through a bounded queue and are dropped when
//! it is full.

use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::header::AUTHORIZATION;
use serde_json::{json, Map, Value};
use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Context, Layer};

use crate::config::ElasticLogConfig;

// Events from the shipper's own HTTP stack would feed back into it.
const SKIPPED_TARGETS: [&str; 3] = ["reqwest", "hyper", module_path!()];

/// Documents waiting to be shipped.
pub const QUEUE_CAPACITY: usize = 1024;

/// Subscriber layer turning events into Elasticsearch documents.
pub struct ElasticLayer {
    sender: mpsc::Sender<Value>,
    level: LevelFilter,
    environment: String,
}

impl ElasticLayer {
    /// Start the shipping task. Must be called from within a Tokio runtime.
    pub fn spawn(config: &ElasticLogConfig, level: LevelFilter, environment: &str) -> Self {
        let (sender, receiver) = mpsc::channel(QUEUE_CAPACITY);

        tokio::spawn(ship(
            reqwest::Client::new(),
            config.uri.clone(),
            config.authorization_header.clone(),
            receiver,
        ));

        Self::new(sender, level, environment)
    }

    fn new(sender: mpsc::Sender<Value>, level: LevelFilter, environment: &str) -> Self {
        Self {
            sender,
            level,
            environment: environment.to_string(),
        }
    }

    fn document(&self, event: &Event<'_>) -> Value {
        let mut fields = Map::new();
        event.record(&mut JsonVisitor(&mut fields));

        let message = fields.remove("message").unwrap_or(Value::String(String::new()));
        let metadata = event.metadata();

        json!({
            "@timestamp": epoch_millis(),
            "message": message,
            "log": {
                "level": metadata.level().as_str(),
                "logger": metadata.target(),
            },
            "service": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
                "environment": self.environment,
            },
            "fields": fields,
        })
    }
}

impl<S: Subscriber> Layer<S> for ElasticLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();

        if self.level < *metadata.level()
            || SKIPPED_TARGETS
                .iter()
                .any(|target| metadata.target().starts_with(target))
        {
            return;
        }

        // Full while Elasticsearch is unreachable, closed once the shipper
        // is gone. Either way the event is dropped.
        let _ = self.sender.try_send(self.document(event));
    }
}

struct JsonVisitor<'a>(&'a mut Map<String, Value>);

impl Visit for JsonVisitor<'_> {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.0.insert(field.name().to_string(), json!(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.0.insert(field.name().to_string(), json!(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.0.insert(field.name().to_string(), json!(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.0.insert(field.name().to_string(), json!(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), json!(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.0
            .insert(field.name().to_string(), json!(format!("{value:?}")));
    }
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

async fn ship(
    client: reqwest::Client,
    uri: String,
    authorization: String,
    mut receiver: mpsc::Receiver<Value>,
) {
    while let Some(document) = receiver.recv().await {
        let result = client
            .post(&uri)
            .header(AUTHORIZATION, &authorization)
            .json(&document)
            .send()
            .await
            .and_then(|response| response.error_for_status());

        if let Err(e) = result {
            tracing::warn!(error = %e, uri = %uri, "Failed to ship log event");
        }
    }
}
