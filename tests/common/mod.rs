//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use jes_http::config::ServerConfig;
use jes_http::engine::{Engine, EngineError, EngineRequest, EngineResponse, JsonBody};
use jes_http::{HttpServer, Shutdown};
use serde_json::Value;
use tokio::net::TcpListener;

/// What the fake engine answers.
#[allow(dead_code)]
pub enum Reply {
    Single(u16, Value),
    Many(Vec<Value>),
    Empty(u16),
    Fail,
}

/// Deterministic engine recording every request it processes.
pub struct FakeEngine {
    reply: Reply,
    calls: AtomicUsize,
    last: Mutex<Option<EngineRequest>>,
}

#[allow(dead_code)]
impl FakeEngine {
    pub fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<EngineRequest> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl Engine for FakeEngine {
    fn returns_multiple(&self, _request: &EngineRequest) -> bool {
        matches!(self.reply, Reply::Many(_))
    }

    async fn process(&self, request: &EngineRequest) -> Result<EngineResponse, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(request.clone());

        match &self.reply {
            Reply::Single(status, value) => {
                Ok(EngineResponse::new(*status).with_body(JsonBody::single(value.clone())))
            }
            Reply::Many(values) => {
                Ok(EngineResponse::new(200).with_body(JsonBody::from_values(values.clone())))
            }
            Reply::Empty(status) => Ok(EngineResponse::new(*status)),
            Reply::Fail => Err(EngineError::Internal("engine exploded".into())),
        }
    }
}

/// Config accepted by validation, served under `/api`.
pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.context_path = "/api".into();
    config.jwt_public_key = "key".into();
    config.mongodb.uri = "mongodb://127.0.0.1:27017".into();
    config.mongodb.database = "es".into();
    config.fanout.uri = "http://127.0.0.1:1/fanout".into();
    config.fanout.secret = "secret".into();
    config.engine.uri = "http://127.0.0.1:1/engine".into();
    config
}

/// Bind an ephemeral port and serve `engine` until the returned coordinator
/// is triggered or dropped.
#[allow(dead_code)]
pub async fn start_server(engine: Arc<dyn Engine>) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(test_config(), engine);
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}
