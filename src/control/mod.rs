//! Control plane integration.
//!
//! # Data Flow
//! ```text
//! LifecycleCoordinator.start/stop
//!     → ControlPlane::dispatch(remote_id, action)
//!     → client.rs: POST {base}/api/v2/servers/{remote_id}/action/{start_server|stop_server}
//!     → 2xx: Accepted | non-2xx: Rejected (soft) | transport error: Err
//! ```
//!
//! # Design Decisions
//! - No retries here; the idle monitor's tick is the retry loop
//! - A rejected request still resolves Ok: readiness is confirmed by the liveness probe
//! - Every request carries a deadline

pub mod client;

use async_trait::async_trait;
use thiserror::Error;

pub use client::RemoteControlClient;

/// Action requested from the control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Start,
    Stop,
}

impl ControlAction {
    /// Path segment used by the control API.
    pub fn endpoint(self) -> &'static str {
        match self {
            ControlAction::Start => "start_server",
            ControlAction::Stop => "stop_server",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ControlAction::Start => "start",
            ControlAction::Stop => "stop",
        }
    }
}

impl std::fmt::Display for ControlAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a delivered control request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionReceipt {
    /// 2xx response.
    Accepted,
    /// Non-2xx response; the request reached the control plane but the outcome is unknown.
    Rejected { status: u16 },
}

/// Errors that prevent a control request from being delivered.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("control request timed out after {0} seconds")]
    Timeout(u64),

    #[error("control request failed: {0}")]
    Transport(reqwest::Error),

    #[error("invalid control API base URL '{0}'")]
    InvalidUrl(String),

    #[error("failed to build HTTP client: {0}")]
    Client(reqwest::Error),
}

/// Anything that can start and stop remote instances.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    async fn dispatch(&self, remote_id: &str, action: ControlAction) -> Result<ActionReceipt, ControlError>;
}
