//! Backend liveness.
//!
//! # Data Flow
//! ```text
//! LifecycleCoordinator.is_online(id)
//!     → LivenessProbe::probe(id) under the coordinator's own deadline
//!     → Some(PingResult) = online; None / Err / timeout = offline
//! ```
//!
//! # Design Decisions
//! - Online status is never cached; every check probes
//! - Probe errors are never surfaced to callers, only logged at debug

pub mod probe;

pub use probe::{LivenessProbe, PingResult, TcpProbe};
