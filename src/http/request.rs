//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4)
//! - Translate the inbound method, URI and headers into an `EngineRequest`
//! - Decode the request body as a single JSON value
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - A URI that does not parse yields no request at all (400 upstream)
//! - Invalid `%` escapes and characters outside RFC 3986 count as unparsable
//! - Path and query reach the engine percent-decoded
//! - A body that does not parse is dropped, never an error

use axum::body::Body;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue, Method, Request, Uri};
use percent_encoding::percent_decode_str;
use serde_json::Value;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::engine::{EngineRequest, Headers};

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates UUID v4 request IDs for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// The parts of an inbound HTTP request the translator reads.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
}

impl InboundRequest {
    pub fn from_parts(parts: &Parts) -> Self {
        Self {
            method: parts.method.clone(),
            uri: parts.uri.to_string(),
            headers: parts.headers.clone(),
        }
    }

    /// Request ID assigned by the request ID layer, if any.
    pub fn request_id(&self) -> &str {
        self.headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
    }
}

/// Path and query of a request target, percent-decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    pub path: String,
    pub query: Option<String>,
}

/// Parse a request target strictly.
///
/// Every character of the path and query must be legal in that component
/// and every `%` must start a two-digit hex escape. The returned components
/// are percent-decoded as UTF-8, invalid sequences replaced.
pub fn parse_target(raw: &str) -> Option<RequestTarget> {
    let uri: Uri = raw.parse().ok()?;

    let path = uri.path();
    if !is_valid_component(path, b"/") {
        return None;
    }

    let query = match uri.query() {
        Some(query) if !is_valid_component(query, b"/?") => return None,
        query => query,
    };

    Some(RequestTarget {
        path: decode(path),
        query: query.map(decode),
    })
}

fn decode(component: &str) -> String {
    percent_decode_str(component).decode_utf8_lossy().into_owned()
}

// RFC 3986 pchar plus the component's extra delimiters.
fn is_valid_component(component: &str, extra: &[u8]) -> bool {
    let bytes = component.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let escape = bytes.get(i + 1..i + 3);
                if !escape.is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit)) {
                    return false;
                }
                i += 3;
                continue;
            }
            b if b.is_ascii_alphanumeric() => {}
            b'-' | b'.' | b'_' | b'~' => {}
            b'!' | b'$' | b'&' | b'\'' | b'(' | b')' | b'*' | b'+' | b',' | b';' | b'=' => {}
            b':' | b'@' => {}
            b if extra.contains(&b) => {}
            _ => return false,
        }
        i += 1;
    }

    true
}

/// Translate an inbound request. Returns `None` when the URI does not parse.
pub fn translate(inbound: &InboundRequest) -> Option<EngineRequest> {
    let target = parse_target(&inbound.uri)?;

    Some(EngineRequest {
        method: inbound.method.as_str().to_string(),
        path: target.path,
        query_string: target.query,
        headers: collect_headers(&inbound.headers),
        body: None,
    })
}

/// Collapse a header multimap, appending repeated names in arrival order.
fn collect_headers(headers: &HeaderMap) -> Headers {
    let mut collected = Headers::new();

    for (name, value) in headers {
        collected
            .entry(name.as_str().to_string())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }

    collected
}

/// Read at most `limit` bytes of `body` and parse them as one JSON object or
/// array. Anything else yields `None`.
pub async fn decode_body(body: Body, limit: usize) -> Option<Value> {
    let bytes = match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(error = %e, "Request body not readable, ignoring");
            return None;
        }
    };

    if bytes.is_empty() {
        return None;
    }

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => Some(value),
        Ok(_) => {
            tracing::debug!("Request body is not a JSON structure, ignoring");
            None
        }
        Err(e) => {
            tracing::debug!(error = %e, "Request body is not JSON, ignoring");
            None
        }
    }
}
