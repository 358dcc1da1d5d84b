//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (axum/hyper)
//!     → server.rs (router, middleware)
//!     → health.rs (GET <contextPath>/health short-circuit)
//!     → handler.rs (pipeline + failure boundary)
//!         → request.rs (translate URI/headers, decode JSON body)
//!         → dispatch.rs (multiplicity flag + engine call)
//!         → response.rs (status, headers, single or streamed array body)
//!     → Send to client
//! ```

pub mod dispatch;
pub mod error;
pub mod handler;
pub mod health;
pub mod request;
pub mod response;
pub mod server;

pub use error::AdapterError;
pub use handler::AppState;
pub use request::{InboundRequest, X_REQUEST_ID};
pub use response::{ByteStream, OutboundResponse};
pub use server::HttpServer;
