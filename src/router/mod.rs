//! Router collaborator seam.
//!
//! The router owns client transport. lazy-fleet only needs to know who is on
//! which backend and to ask the router to move or message a client.
//!
//! # Data Flow
//! ```text
//! router ──POST /router/sessions──────────▶ SessionRoster (attach/detach)
//! router ◀──WS /router/directives────────── SessionRoster (Transfer / Message)
//! ```

pub mod session;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use session::{DirectiveKind, RouterDirective, SessionRoster};

/// Opaque router-side client reference (player UUID or name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub String);

impl ClientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Errors reported by router collaborators.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("server '{0}' is not known to the router")]
    UnknownServer(String),

    #[error("no router is connected")]
    Disconnected,

    #[error("probe failed: {0}")]
    Probe(#[from] std::io::Error),
}

/// Client roster and transfer operations.
#[async_trait]
pub trait Roster: Send + Sync {
    /// Number of clients currently attached to a backend.
    async fn players_on(&self, backend_id: &str) -> usize;

    /// Clients currently attached to a backend.
    async fn clients_on(&self, backend_id: &str) -> Vec<ClientId>;

    /// Ask the router to move a client to `destination`.
    async fn relocate(&self, client: &ClientId, destination: &str) -> Result<(), RouterError>;

    /// Send a short human-readable message to a client. Best effort.
    async fn notify(&self, client: &ClientId, text: &str);
}
