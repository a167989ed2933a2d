//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once at startup
//! - Honor `RUST_LOG` over the configured level
//!
//! # Design Decisions
//! - Uses the tracing crate for structured logging
//! - Configured level applies to this crate and tower_http; everything else stays at warn

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter used when `RUST_LOG` is unset.
pub fn default_filter(level: &str) -> String {
    format!("warn,lazy_fleet={level},tower_http={level}")
}

/// Initialize the global subscriber. Later calls are ignored.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
