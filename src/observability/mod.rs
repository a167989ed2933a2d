//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and gauges)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Every log event carries the backend id as a field where one applies
//! - Request IDs are attached by the HTTP layer and show up in request spans

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::init_metrics;
