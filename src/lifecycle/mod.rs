//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build Fleet → Schedule idle checks → Start listener
//!
//! Scheduling (scheduler.rs):
//!     register(period, task) → TaskHandle → cancel() on shutdown
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Cancel tasks → Stop accepting → Drain requests → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then core, then listeners
//! - Ordered shutdown: cancel timers, stop accept, drain

pub mod scheduler;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use scheduler::{Scheduler, TaskHandle, TokioScheduler};
pub use shutdown::{Shutdown, ShutdownSignal};
pub use startup::{Fleet, StartupError};
