//! Session roster fed by router hooks.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::router::{ClientId, Roster, RouterError};

const DIRECTIVE_CAPACITY: usize = 256;

/// Instruction for the router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterDirective {
    pub id: Uuid,
    #[serde(flatten)]
    pub kind: DirectiveKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DirectiveKind {
    /// Move `client` to `backend`.
    Transfer { client: ClientId, backend: String },
    /// Show `text` to `client`.
    Message { client: ClientId, text: String },
}

impl RouterDirective {
    fn new(kind: DirectiveKind) -> Self {
        Self { id: Uuid::new_v4(), kind }
    }
}

/// Tracks which client is attached to which backend, as reported by the
/// router, and publishes directives back to it.
#[derive(Debug)]
pub struct SessionRoster {
    attachments: DashMap<ClientId, String>,
    directives: broadcast::Sender<RouterDirective>,
}

impl SessionRoster {
    pub fn new() -> Self {
        let (directives, _) = broadcast::channel(DIRECTIVE_CAPACITY);
        Self {
            attachments: DashMap::new(),
            directives,
        }
    }

    /// Record that `client` is now on `backend`. Returns the previous backend.
    pub fn attach(&self, client: ClientId, backend: &str) -> Option<String> {
        tracing::debug!(client = %client, backend = %backend, "Client attached");
        self.attachments.insert(client, backend.to_string())
    }

    /// Record that `client` left the network.
    pub fn detach(&self, client: &ClientId) -> Option<String> {
        let previous = self.attachments.remove(client).map(|(_, backend)| backend);
        tracing::debug!(client = %client, backend = ?previous, "Client detached");
        previous
    }

    /// Backend the client is currently attached to.
    pub fn location(&self, client: &ClientId) -> Option<String> {
        self.attachments.get(client).map(|entry| entry.value().clone())
    }

    /// Subscribe to the directive stream.
    pub fn subscribe(&self) -> broadcast::Receiver<RouterDirective> {
        self.directives.subscribe()
    }

    /// Number of connected directive consumers.
    pub fn router_count(&self) -> usize {
        self.directives.receiver_count()
    }

    fn publish(&self, kind: DirectiveKind) -> Result<(), RouterError> {
        self.directives
            .send(RouterDirective::new(kind))
            .map(|_| ())
            .map_err(|_| RouterError::Disconnected)
    }
}

impl Default for SessionRoster {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Roster for SessionRoster {
    async fn players_on(&self, backend_id: &str) -> usize {
        self.attachments
            .iter()
            .filter(|entry| entry.value() == backend_id)
            .count()
    }

    async fn clients_on(&self, backend_id: &str) -> Vec<ClientId> {
        self.attachments
            .iter()
            .filter(|entry| entry.value() == backend_id)
            .map(|entry| entry.key().clone())
            .collect()
    }

    async fn relocate(&self, client: &ClientId, destination: &str) -> Result<(), RouterError> {
        self.publish(DirectiveKind::Transfer {
            client: client.clone(),
            backend: destination.to_string(),
        })
    }

    async fn notify(&self, client: &ClientId, text: &str) {
        let sent = self.publish(DirectiveKind::Message {
            client: client.clone(),
            text: text.to_string(),
        });
        if sent.is_err() {
            tracing::debug!(client = %client, "Dropped client message, no router connected");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_attach_and_count() {
        let roster = SessionRoster::new();
        roster.attach("alice".into(), "survival");
        roster.attach("bob".into(), "survival");
        roster.attach("carol".into(), "lobby");
        assert_eq!(roster.players_on("survival").await, 2);

        assert_eq!(roster.attach("bob".into(), "lobby").as_deref(), Some("survival"));
        assert_eq!(roster.players_on("survival").await, 1);
        assert_eq!(roster.clients_on("lobby").await.len(), 2);

        roster.detach(&"alice".into());
        assert_eq!(roster.players_on("survival").await, 0);
    }

    #[tokio::test]
    async fn test_relocate_without_router_fails() {
        let roster = SessionRoster::new();
        let err = roster.relocate(&"alice".into(), "lobby").await.unwrap_err();
        assert!(matches!(err, RouterError::Disconnected));
    }

    #[tokio::test]
    async fn test_relocate_publishes_directive() {
        let roster = SessionRoster::new();
        let mut rx = roster.subscribe();

        roster.relocate(&"alice".into(), "survival").await.unwrap();
        roster.notify(&"alice".into(), "survival is starting").await;

        let first = rx.recv().await.unwrap();
        assert_eq!(
            first.kind,
            DirectiveKind::Transfer { client: "alice".into(), backend: "survival".into() }
        );
        let second = rx.recv().await.unwrap();
        assert!(matches!(second.kind, DirectiveKind::Message { .. }));
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_directive_wire_format() {
        let directive = RouterDirective::new(DirectiveKind::Transfer {
            client: "alice".into(),
            backend: "survival".into(),
        });
        let value = serde_json::to_value(&directive).unwrap();
        assert_eq!(value["type"], "transfer");
        assert_eq!(value["client"], "alice");
        assert_eq!(value["backend"], "survival");
        assert!(value["id"].is_string());
    }
}
