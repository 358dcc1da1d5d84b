//! Per-request adapter pipeline.
//!
//! # Request States
//! ```text
//! Received → Translating ──(bad URI)──→ 400, empty body
//!          → BodyDecoded → Dispatched ──(error)──→ 500, empty body
//!          → Encoded → handed to the transport
//! ```
//!
//! The health check is answered by middleware before this pipeline runs.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::Response,
};

use crate::engine::{Engine, EngineRequest};
use crate::http::dispatch::dispatch;
use crate::http::error::AdapterError;
use crate::http::request::{decode_body, translate, InboundRequest};
use crate::http::response::{encode, ByteStream, OutboundResponse};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<dyn Engine>,
    pub max_body_bytes: usize,
    pub engine_timeout: Duration,
}

/// Axum entry point for every non-health request.
pub async fn adapter_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    handle(&state, InboundRequest::from_parts(&parts), body).await
}

/// Run the pipeline for one request.
pub async fn handle(state: &AppState, inbound: InboundRequest, body: Body) -> Response {
    let mut outbound = OutboundResponse::new();

    let Some(mut request) = translate(&inbound) else {
        tracing::warn!(
            request_id = %inbound.request_id(),
            uri = %inbound.uri,
            "Malformed request URI"
        );
        outbound.set_status(StatusCode::BAD_REQUEST);
        return outbound.into_response(None);
    };

    request.body = decode_body(body, state.max_body_bytes).await;

    tracing::debug!(
        request_id = %inbound.request_id(),
        method = %request.method,
        path = %request.path,
        has_body = request.body.is_some(),
        "Dispatching request"
    );

    let body = match process(state, &request, &mut outbound).await {
        Ok(body) => body,
        Err(e) => {
            fail(&mut outbound, &e);
            None
        }
    };

    outbound.into_response(body)
}

async fn process(
    state: &AppState,
    request: &EngineRequest,
    outbound: &mut OutboundResponse,
) -> Result<Option<ByteStream>, AdapterError> {
    let dispatched = dispatch(state.engine.as_ref(), request, state.engine_timeout).await?;
    encode(dispatched.response, outbound, dispatched.multiple)
}

/// The single conversion point from an error to a 500 response.
fn fail(outbound: &mut OutboundResponse, error: &AdapterError) {
    tracing::error!(error = %error);
    outbound.headers_mut().clear();
    outbound.set_status(StatusCode::INTERNAL_SERVER_ERROR);
}
