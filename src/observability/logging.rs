//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Translate the configured log level
//! - Attach Elasticsearch shipping when configured
//!
//! # Design Decisions
//! - `RUST_LOG` overrides the configured level
//! - Level names from java.util.logging are accepted for existing configs

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::observability::elastic::ElasticLayer;

/// Parse a level name, case-insensitively.
pub fn parse_level(level: &str) -> Option<LevelFilter> {
    let level = match level.trim().to_ascii_uppercase().as_str() {
        "OFF" => LevelFilter::OFF,
        "ERROR" | "SEVERE" => LevelFilter::ERROR,
        "WARN" | "WARNING" => LevelFilter::WARN,
        "INFO" => LevelFilter::INFO,
        "DEBUG" | "CONFIG" | "FINE" => LevelFilter::DEBUG,
        "TRACE" | "FINER" | "FINEST" | "ALL" => LevelFilter::TRACE,
        _ => return None,
    };
    Some(level)
}

fn default_directives(level: LevelFilter) -> String {
    format!("jes_http={level},tower_http={level}")
}

/// Install the global subscriber.
pub fn init(level: LevelFilter, elastic: Option<ElasticLayer>) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directives(level))),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(elastic)
        .try_init()
}
