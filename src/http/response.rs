//! Response handling and transformation.
//!
//! # Responsibilities
//! - Map the engine's status code 1:1 onto the outbound response
//! - Append engine headers (multi-valued, never replacing)
//! - Encode JSON bodies as a single value or as a streamed array
//!
//! # Design Decisions
//! - Streaming responses avoid buffering the entire body: array elements are
//!   serialized one at a time as the transport polls
//! - Element order is the engine's order
//! - Content-Type is always `application/json` when a body exists

use std::convert::Infallible;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use futures_util::stream::{BoxStream, Stream, StreamExt};
use serde_json::Value;

use crate::engine::{EngineResponse, Headers};
use crate::http::error::AdapterError;

/// Lazily produced response body handed to the transport.
pub type ByteStream = BoxStream<'static, Bytes>;

/// Status and headers of the response under construction.
#[derive(Debug, Clone)]
pub struct OutboundResponse {
    status: StatusCode,
    headers: HeaderMap,
}

impl Default for OutboundResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl OutboundResponse {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Finish the response; without a byte stream the body is empty.
    pub fn into_response(self, body: Option<ByteStream>) -> Response {
        let body = match body {
            Some(chunks) => Body::from_stream(chunks.map(Ok::<_, Infallible>)),
            None => Body::empty(),
        };

        let mut response = Response::new(body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Apply an engine response to `outbound` and return the body stream, if the
/// engine produced a body.
pub fn encode(
    response: EngineResponse,
    outbound: &mut OutboundResponse,
    multiple: bool,
) -> Result<Option<ByteStream>, AdapterError> {
    let status = StatusCode::from_u16(response.status_code)
        .map_err(|_| AdapterError::InvalidStatus(response.status_code))?;
    outbound.set_status(status);

    if let Some(headers) = &response.headers {
        copy_headers(headers, outbound.headers_mut())?;
    }

    let Some(body) = response.body else {
        return Ok(None);
    };

    outbound
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let values = body.into_stream();
    let chunks = if multiple {
        JsonArray::new(values).boxed()
    } else {
        values.map(|value| Bytes::from(value.to_string())).boxed()
    };

    Ok(Some(chunks))
}

fn copy_headers(from: &Headers, to: &mut HeaderMap) -> Result<(), AdapterError> {
    for (name, values) in from {
        let header = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            AdapterError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            }
        })?;

        for value in values {
            let value = HeaderValue::from_str(value).map_err(|e| AdapterError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
            to.append(header.clone(), value);
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArrayState {
    /// Nothing emitted yet.
    Opening,
    /// At least one element emitted.
    Elements,
    /// Closing bracket emitted.
    Closed,
}

/// Frames a stream of JSON values as a JSON array, one chunk per element.
///
/// The first chunk carries the opening `[`, every later element is preceded
/// by `,`, and a final chunk carries the closing `]`. An empty source yields
/// the single chunk `[]`.
pub struct JsonArray {
    elements: BoxStream<'static, Value>,
    state: ArrayState,
}

impl JsonArray {
    pub fn new(elements: BoxStream<'static, Value>) -> Self {
        Self {
            elements,
            state: ArrayState::Opening,
        }
    }
}

impl Stream for JsonArray {
    type Item = Bytes;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Bytes>> {
        let this = &mut *self;

        if this.state == ArrayState::Closed {
            return Poll::Ready(None);
        }

        let chunk = match ready!(this.elements.poll_next_unpin(cx)) {
            Some(value) => {
                let lead = match this.state {
                    ArrayState::Opening => '[',
                    _ => ',',
                };
                this.state = ArrayState::Elements;
                Bytes::from(format!("{lead}{value}"))
            }
            None => {
                let tail: &'static [u8] = match this.state {
                    ArrayState::Opening => b"[]",
                    _ => b"]",
                };
                this.state = ArrayState::Closed;
                Bytes::from_static(tail)
            }
        };

        Poll::Ready(Some(chunk))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::JsonBody;
    use futures_util::stream;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    async fn chunks(body: ByteStream) -> Vec<String> {
        body.map(|chunk| String::from_utf8(chunk.to_vec()).unwrap())
            .collect()
            .await
    }

    async fn text(body: ByteStream) -> String {
        chunks(body).await.concat()
    }

    fn three() -> JsonBody {
        JsonBody::from_values(vec![json!({"a": 1}), json!({"b": 2}), json!({"c": 3})])
    }

    #[tokio::test]
    async fn test_single_value() {
        let response = EngineResponse::new(200).with_body(JsonBody::single(json!({"a": 1})));
        let mut outbound = OutboundResponse::new();

        let body = encode(response, &mut outbound, false).unwrap().unwrap();

        assert_eq!(text(body).await, r#"{"a":1}"#);
        assert_eq!(outbound.status(), StatusCode::OK);
        assert_eq!(outbound.headers()[CONTENT_TYPE], "application/json");
    }

    #[tokio::test]
    async fn test_multiple_values() {
        let response = EngineResponse::new(200).with_body(three());
        let mut outbound = OutboundResponse::new();

        let body = encode(response, &mut outbound, true).unwrap().unwrap();
        let text = text(body).await;

        assert_eq!(text, r#"[{"a":1},{"b":2},{"c":3}]"#);
        assert!(serde_json::from_str::<Value>(&text).unwrap().is_array());
    }

    #[tokio::test]
    async fn test_multiple_values_chunking() {
        let body = JsonArray::new(three().into_stream()).boxed();

        assert_eq!(
            chunks(body).await,
            vec![r#"[{"a":1}"#, r#",{"b":2}"#, r#",{"c":3}"#, "]"]
        );
    }

    #[tokio::test]
    async fn test_empty_collection() {
        let response = EngineResponse::new(200).with_body(JsonBody::from_values(Vec::new()));
        let mut outbound = OutboundResponse::new();

        let body = encode(response, &mut outbound, true).unwrap().unwrap();

        assert_eq!(text(body).await, "[]");
    }

    #[tokio::test]
    async fn test_array_is_produced_on_demand() {
        let produced = Arc::new(AtomicUsize::new(0));
        let counter = produced.clone();
        let elements = stream::iter(0..1_000)
            .map(move |i| {
                counter.fetch_add(1, Ordering::SeqCst);
                json!({ "i": i })
            })
            .boxed();

        let mut array = JsonArray::new(elements);

        assert_eq!(array.next().await.unwrap(), Bytes::from(r#"[{"i":0}"#));
        assert_eq!(produced.load(Ordering::SeqCst), 1);

        assert_eq!(array.next().await.unwrap(), Bytes::from(r#",{"i":1}"#));
        assert_eq!(produced.load(Ordering::SeqCst), 2);

        drop(array);
        assert_eq!(produced.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_closed_array_stays_closed() {
        let mut array = JsonArray::new(stream::empty().boxed());

        assert_eq!(array.next().await, Some(Bytes::from_static(b"[]")));
        assert_eq!(array.next().await, None);
        assert_eq!(array.next().await, None);
    }

    #[test]
    fn test_no_body() {
        let response = EngineResponse::new(204).with_header("content-type", "text/plain");
        let mut outbound = OutboundResponse::new();

        let body = encode(response, &mut outbound, true).unwrap();

        assert!(body.is_none());
        assert_eq!(outbound.status(), StatusCode::NO_CONTENT);
        assert_eq!(outbound.headers()[CONTENT_TYPE], "text/plain");
    }

    #[test]
    fn test_status_passthrough() {
        for code in [201, 301, 404, 409, 503] {
            let mut outbound = OutboundResponse::new();
            encode(EngineResponse::new(code), &mut outbound, false).unwrap();
            assert_eq!(outbound.status().as_u16(), code);
        }
    }

    #[test]
    fn test_content_type_overridden() {
        let response = EngineResponse::new(200)
            .with_header("content-type", "text/plain")
            .with_body(JsonBody::single(json!({})));
        let mut outbound = OutboundResponse::new();

        encode(response, &mut outbound, false).unwrap();

        let values: Vec<_> = outbound.headers().get_all(CONTENT_TYPE).iter().collect();
        assert_eq!(values, vec!["application/json"]);
    }

    #[test]
    fn test_headers_are_appended() {
        let response = EngineResponse::new(200)
            .with_header("x-tag", "one")
            .with_header("x-tag", "two")
            .with_header("cache-control", "no-cache");
        let mut outbound = OutboundResponse::new();
        outbound
            .headers_mut()
            .insert("x-tag", HeaderValue::from_static("zero"));

        encode(response, &mut outbound, false).unwrap();

        let tags: Vec<_> = outbound.headers().get_all("x-tag").iter().collect();
        assert_eq!(tags, vec!["zero", "one", "two"]);
        assert_eq!(outbound.headers()["cache-control"], "no-cache");
    }

    #[test]
    fn test_invalid_status() {
        let mut outbound = OutboundResponse::new();
        let err = encode(EngineResponse::new(42), &mut outbound, false).err().unwrap();
        assert!(matches!(err, AdapterError::InvalidStatus(42)));
    }

    #[test]
    fn test_invalid_header() {
        let response = EngineResponse::new(200).with_header("bad header", "x");
        let mut outbound = OutboundResponse::new();

        let err = encode(response, &mut outbound, false).err().unwrap();
        assert!(matches!(err, AdapterError::InvalidHeader { ref name, .. } if name == "bad header"));

        let response = EngineResponse::new(200).with_header("x-ok", "line\nbreak");
        let err = encode(response, &mut outbound, false).err().unwrap();
        assert!(matches!(err, AdapterError::InvalidHeader { .. }));
    }

    #[tokio::test]
    async fn test_into_response() {
        use http_body_util::BodyExt;

        let mut outbound = OutboundResponse::new();
        outbound.set_status(StatusCode::CREATED);
        let body = stream::iter(vec![Bytes::from("ab"), Bytes::from("cd")]).boxed();

        let response = outbound.into_response(Some(body));
        assert_eq!(response.status(), StatusCode::CREATED);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(bytes, "abcd");

        let empty = OutboundResponse::new().into_response(None);
        let bytes = empty.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.is_empty());
    }
}
