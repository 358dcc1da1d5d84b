//! Dispatch of translated requests to the engine.
//!
//! # Responsibilities
//! - Capture the multiplicity flag once per request
//! - Invoke the engine with the same request value, under a timeout
//!
//! # Design Decisions
//! - Both calls borrow one `&EngineRequest`; no copy can diverge
//! - No retries here; retry policy belongs to the engine

use std::time::Duration;

use crate::engine::{Engine, EngineError, EngineRequest, EngineResponse};

/// Engine response together with the flag that decides its framing.
#[derive(Debug)]
pub struct Dispatched {
    pub multiple: bool,
    pub response: EngineResponse,
}

/// Ask the engine how to frame the answer, then let it process the request.
pub async fn dispatch(
    engine: &dyn Engine,
    request: &EngineRequest,
    timeout: Duration,
) -> Result<Dispatched, EngineError> {
    let multiple = engine.returns_multiple(request);

    let response = tokio::time::timeout(timeout, engine.process(request))
        .await
        .map_err(|_| EngineError::Timeout(timeout))??;

    Ok(Dispatched { multiple, response })
}
