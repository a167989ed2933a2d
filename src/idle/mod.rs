//! Idle detection.
//!
//! # Data Flow
//! ```text
//! Scheduler tick (idle.check_interval_secs)
//!     → IdleMonitor::tick
//!         → for each managed backend, concurrently:
//!             mode exempt?           → skip
//!             stop already issued?   → skip
//!             idle < timeout?        → skip
//!             players > 0?           → reset clock, skip
//!             stop → relocate to lobby (if enabled)
//! ```
//!
//! # Design Decisions
//! - The monitor only reads activity; gate, commands and delivery write it
//! - A failed stop is retried by the next tick, with no separate backoff
//! - One backend's failure never affects the others

pub mod monitor;

pub use monitor::{IdleMonitor, IdleReport, IdleVerdict};
