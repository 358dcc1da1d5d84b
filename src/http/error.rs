//! Errors raised between dispatch and encoding.
//!
//! Every variant ends at the failure boundary as a 500 with an empty body.

use thiserror::Error;

use crate::engine::EngineError;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The engine produced a status code HTTP cannot carry.
    #[error("invalid status code {0}")]
    InvalidStatus(u16),

    /// The engine produced a header that cannot be sent.
    #[error("invalid response header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },
}
