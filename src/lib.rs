//! HTTP server for JSON Event Sourcing.
//!
//! Exposes an event-sourcing engine over plain HTTP: requests are translated
//! into engine requests, dispatched, and the engine's answer is written back
//! as a JSON value or a streamed JSON array.

// Core subsystems
pub mod config;
pub mod engine;
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::ServerConfig;
pub use engine::{Engine, EngineError, EngineRequest, EngineResponse, JsonBody};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
