//! Managed backend lifecycle.
//!
//! # Data Flow
//! ```text
//! ConnectionGate ──enqueue_pending / start / watch_startup──▶ LifecycleCoordinator
//! IdleMonitor ─────player_count / stop / relocate_all───────▶ LifecycleCoordinator
//! router hook ─────deliver_pending──────────────────────────▶ LifecycleCoordinator
//!
//! LifecycleCoordinator
//!     → ControlPlane (start/stop)
//!     → LivenessProbe (is_online, wait_until_online)
//!     → Roster (player counts, transfers, messages)
//! ```
//!
//! # Design Decisions
//! - Unknown ids fail with `NotManaged` before any network call
//! - Online status is derived per call, never stored
//! - Pending clients are delivered by whichever online event drains first

pub mod activity;
pub mod backend;
pub mod coordinator;
pub mod error;
pub mod pending;

pub use activity::ActivityTracker;
pub use backend::{BackendDescriptor, BackendSet};
pub use coordinator::{CoordinatorSettings, LifecycleCoordinator, RelocationSummary};
pub use error::{FleetError, FleetResult};
pub use pending::PendingQueue;
