//! Liveness check.
//!
//! `GET <contextPath>/health` answers 200 with an empty body before the
//! engine pipeline runs, so it keeps answering when the engine is down.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::http::request::parse_target;
use crate::http::response::OutboundResponse;

/// Matcher for the health-check endpoint.
#[derive(Debug, Clone)]
pub struct HealthCheck {
    path: Arc<str>,
}

impl HealthCheck {
    pub fn new(context_path: &str) -> Self {
        Self {
            path: format!("{context_path}/health").into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// True for GET requests whose URI parses and whose decoded path is the
    /// health path.
    pub fn matches(&self, method: &Method, uri: &str) -> bool {
        method == Method::GET
            && parse_target(uri).is_some_and(|target| target.path == *self.path)
    }
}

/// Middleware answering the health check ahead of every other handler.
pub async fn health_check_middleware(
    State(health): State<HealthCheck>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if health.matches(request.method(), &request.uri().to_string()) {
        let mut outbound = OutboundResponse::new();
        outbound.set_status(StatusCode::OK);
        return outbound.into_response(None);
    }

    next.run(request).await
}
