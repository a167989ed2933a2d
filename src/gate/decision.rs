//! Gate request and decision types.

use serde::{Deserialize, Serialize};

use crate::router::ClientId;

/// A router-intercepted connect attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectAttempt {
    pub client: ClientId,
    /// Backend the client is trying to reach.
    pub target: String,
    /// Backend the client is on now, if any.
    #[serde(default)]
    pub current: Option<String>,
}

/// Why an attempt was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// The backend is hard-forced off, or offline with auto-start forbidden.
    Disabled,
    /// A start was triggered; the client is queued.
    Starting,
}

/// What the router should do with an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum GateDecision {
    /// Let the connection through unchanged.
    Allow,
    /// Cancel the connection, optionally sending the client elsewhere.
    Deny {
        reason: DenyReason,
        redirect_to: Option<String>,
        message: String,
    },
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allow)
    }

    pub fn redirect(&self) -> Option<&str> {
        match self {
            GateDecision::Allow => None,
            GateDecision::Deny { redirect_to, .. } => redirect_to.as_deref(),
        }
    }

    pub(crate) fn metric_label(&self) -> &'static str {
        match self {
            GateDecision::Allow => "allow",
            GateDecision::Deny { reason: DenyReason::Disabled, .. } => "deny_disabled",
            GateDecision::Deny { reason: DenyReason::Starting, .. } => "deny_starting",
        }
    }
}

/// Result of an explicit "connect me to X" request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ConnectOutcome {
    /// The backend is not managed.
    Unknown { backend: String },
    /// The router was told to transfer the client.
    Connected { backend: String },
    /// Mode forbids starting the backend.
    Disabled { backend: String },
    /// The backend did not come online within the start window.
    StartTimeout { backend: String },
    /// The start request or the transfer failed.
    Failed { backend: String, reason: String },
}

impl ConnectOutcome {
    /// Short message for the requesting client.
    pub fn message(&self) -> String {
        match self {
            ConnectOutcome::Unknown { backend } => format!("Unknown server: {backend}"),
            ConnectOutcome::Connected { backend } => format!("Connecting to {backend}."),
            ConnectOutcome::Disabled { backend } => format!("{backend} is currently disabled."),
            ConnectOutcome::StartTimeout { backend } => {
                format!("{backend} did not start in time. Please try again.")
            }
            ConnectOutcome::Failed { backend, reason } => {
                format!("Could not connect to {backend}: {reason}")
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectOutcome::Connected { .. })
    }
}
