//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, stdout)
//!     → elastic.rs (same events shipped to Elasticsearch, optional)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, Elasticsearch)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through logs and to the engine
//! - Metrics are cheap (atomic increments)

pub mod elastic;
pub mod logging;
pub mod metrics;
