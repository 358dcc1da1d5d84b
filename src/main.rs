//! JSON Event Sourcing HTTP server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request      ┌──────────────────────────────────────────────┐
//!     ────────────────────┼─▶ health check ──(GET <ctx>/health)──▶ 200   │
//!                         │        │                                     │
//!                         │        ▼                                     │
//!                         │   translate ──(bad URI)──▶ 400               │
//!                         │        │                                     │
//!                         │        ▼                                     │
//!                         │   decode body ──▶ dispatch ──────────────────┼──▶ Engine
//!                         │                      │                       │
//!                         │                      ▼                       │
//!     Client Response     │   encode (value | streamed array)            │
//!     ◀───────────────────┼──     or 500 on any failure                  │
//!                         └──────────────────────────────────────────────┘
//! ```
//!
//! Usage: `jes-http <PORT> [--config conf/application.toml]`

use clap::Parser;

use jes_http::lifecycle::{startup, Cli};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    startup::run(Cli::parse()).await?;
    Ok(())
}
