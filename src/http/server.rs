//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the adapter handler
//! - Wire up middleware (metrics, tracing, request ID, health check)
//! - Bind server to listener
//! - Stop on shutdown signal

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::any, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::engine::Engine;
use crate::http::handler::{adapter_handler, AppState};
use crate::http::health::{health_check_middleware, HealthCheck};
use crate::http::request::UuidRequestId;
use crate::observability::metrics;

/// HTTP server exposing an engine.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and engine.
    pub fn new(config: ServerConfig, engine: Arc<dyn Engine>) -> Self {
        let state = AppState {
            engine,
            max_body_bytes: config.limits.max_body_bytes,
            engine_timeout: Duration::from_secs(config.timeouts.engine_secs),
        };
        let health = HealthCheck::new(&config.context_path);

        let router = Self::build_router(state, health);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers run top to bottom: metrics, request ID, tracing, health check,
    /// then the adapter handler.
    fn build_router(state: AppState, health: HealthCheck) -> Router {
        Router::new()
            .route("/", any(adapter_handler))
            .route("/{*path}", any(adapter_handler))
            .with_state(state)
            .layer(middleware::from_fn_with_state(health, health_check_middleware))
            .layer(
                ServiceBuilder::new()
                    .layer(middleware::from_fn(metrics::track_requests))
                    .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until the
    /// shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            context_path = %self.config.context_path,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
