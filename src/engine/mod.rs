//! Event-sourcing engine boundary.
//!
//! # Data Flow
//! ```text
//! http::request (translate + decode body)
//!     → EngineRequest
//!     → Engine::returns_multiple (sync, once)
//!     → Engine::process (async, same request value)
//!     → EngineResponse
//!     → http::response (encode)
//! ```
//!
//! # Design Decisions
//! - The engine is an injected trait object so the adapter can run against
//!   a remote engine in production and a fake one in tests
//! - Both engine calls borrow the same `&EngineRequest`
//! - Response bodies are lazy streams of JSON values; the adapter decides
//!   how to frame them from the multiplicity flag

pub mod remote;
pub mod settings;

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, Stream, StreamExt};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub use remote::RemoteEngine;
pub use settings::EngineSettings;

/// Header mapping exchanged with the engine. Values keep their arrival order.
pub type Headers = HashMap<String, Vec<String>>;

/// Engine-agnostic request produced by the request translator.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineRequest {
    pub method: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_string: Option<String>,
    pub headers: Headers,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl EngineRequest {
    /// First value of a header, looked up case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .and_then(|(_, values)| values.first())
            .map(String::as_str)
    }
}

/// Lazy sequence of JSON values making up a response body.
pub struct JsonBody(BoxStream<'static, Value>);

impl JsonBody {
    /// A body holding exactly one value.
    pub fn single(value: Value) -> Self {
        Self(stream::once(async move { value }).boxed())
    }

    /// A body produced from an in-memory collection, yielded one at a time.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: Send + 'static,
    {
        Self(stream::iter(values).boxed())
    }

    /// A body produced on demand by the engine.
    pub fn from_stream<S>(values: S) -> Self
    where
        S: Stream<Item = Value> + Send + 'static,
    {
        Self(values.boxed())
    }

    pub fn into_stream(self) -> BoxStream<'static, Value> {
        self.0
    }
}

impl fmt::Debug for JsonBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JsonBody(..)")
    }
}

/// Response produced by the engine, read-only to the adapter.
#[derive(Debug)]
pub struct EngineResponse {
    pub status_code: u16,
    pub headers: Option<Headers>,
    pub body: Option<JsonBody>,
}

impl EngineResponse {
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            headers: None,
            body: None,
        }
    }

    /// Append a header value, keeping earlier values for the same name.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(Headers::new)
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    pub fn with_body(mut self, body: JsonBody) -> Self {
        self.body = Some(body);
        self
    }
}

/// Errors surfaced by an engine while processing a request.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine could not be reached.
    #[error("engine unavailable: {0}")]
    Unavailable(String),

    /// The engine did not answer in time.
    #[error("engine did not answer within {0:?}")]
    Timeout(Duration),

    /// The engine endpoint refused the exchange itself.
    #[error("engine rejected the exchange with status {0}")]
    Rejected(u16),

    /// The engine answered with something that is not a response.
    #[error("engine protocol error: {0}")]
    Protocol(String),

    /// Any other failure inside the engine.
    #[error("engine failure: {0}")]
    Internal(String),
}

/// Capability interface of the event-sourcing engine.
///
/// Implementations must answer `returns_multiple` consistently for the
/// request value they are later asked to `process`.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Whether the response to `request` is a collection of JSON values.
    fn returns_multiple(&self, request: &EngineRequest) -> bool;

    /// Process the request and produce its response.
    async fn process(&self, request: &EngineRequest) -> Result<EngineResponse, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serializes_camel_case() {
        let request = EngineRequest {
            method: "GET".into(),
            path: "/app/counter".into(),
            query_string: Some("a=1".into()),
            headers: Headers::from([("accept".to_string(), vec!["*/*".to_string()])]),
            body: None,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "method": "GET",
                "path": "/app/counter",
                "queryString": "a=1",
                "headers": {"accept": ["*/*"]},
            })
        );
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let request = EngineRequest {
            headers: Headers::from([(
                "x-request-id".to_string(),
                vec!["one".to_string(), "two".to_string()],
            )]),
            ..Default::default()
        };

        assert_eq!(request.header("X-Request-Id"), Some("one"));
        assert_eq!(request.header("missing"), None);
    }

    #[test]
    fn test_with_header_accumulates() {
        let response = EngineResponse::new(200)
            .with_header("set-cookie", "a=1")
            .with_header("set-cookie", "b=2");

        let headers = response.headers.unwrap();
        assert_eq!(headers["set-cookie"], vec!["a=1", "b=2"]);
    }

    #[tokio::test]
    async fn test_json_body_yields_values_in_order() {
        let body = JsonBody::from_values(vec![json!(1), json!(2), json!(3)]);
        let values: Vec<Value> = body.into_stream().collect().await;
        assert_eq!(values, vec![json!(1), json!(2), json!(3)]);
    }
}
