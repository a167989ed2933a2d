//! Clients waiting for a backend to come online.

use dashmap::DashMap;

use crate::router::ClientId;

/// Per-backend FIFO of waiting clients.
///
/// `push` appends under the shard lock for that backend; `drain` removes the
/// whole entry in one step, so a client is returned by exactly one drain.
#[derive(Debug, Default)]
pub struct PendingQueue {
    queues: DashMap<String, Vec<ClientId>>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a client unless it is already waiting. Returns the queue length.
    pub fn push(&self, id: &str, client: ClientId) -> usize {
        let mut queue = self.queues.entry(id.to_string()).or_default();
        if !queue.contains(&client) {
            queue.push(client);
        }
        queue.len()
    }

    /// Take one client out of the queue. Returns `false` if it was not waiting.
    pub fn remove(&self, id: &str, client: &ClientId) -> bool {
        let Some(mut queue) = self.queues.get_mut(id) else {
            return false;
        };
        let Some(pos) = queue.iter().position(|waiting| waiting == client) else {
            return false;
        };
        queue.remove(pos);
        true
    }

    /// Remove and return every waiting client, in arrival order.
    pub fn drain(&self, id: &str) -> Vec<ClientId> {
        self.queues.remove(id).map(|(_, clients)| clients).unwrap_or_default()
    }

    pub fn len(&self, id: &str) -> usize {
        self.queues.get(id).map_or(0, |queue| queue.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_drain_preserves_order() {
        let queue = PendingQueue::new();
        queue.push("survival", "alice".into());
        queue.push("survival", "bob".into());
        queue.push("creative", "carol".into());

        assert_eq!(queue.drain("survival"), vec![ClientId::from("alice"), ClientId::from("bob")]);
        assert!(queue.drain("survival").is_empty());
        assert_eq!(queue.len("creative"), 1);
    }

    #[test]
    fn test_push_ignores_client_already_waiting() {
        let queue = PendingQueue::new();
        assert_eq!(queue.push("survival", "alice".into()), 1);
        assert_eq!(queue.push("survival", "bob".into()), 2);
        assert_eq!(queue.push("survival", "alice".into()), 2);
        assert_eq!(queue.push("creative", "alice".into()), 1);

        assert_eq!(queue.drain("survival"), vec![ClientId::from("alice"), ClientId::from("bob")]);
    }

    #[test]
    fn test_remove_single_client() {
        let queue = PendingQueue::new();
        queue.push("survival", "alice".into());
        queue.push("survival", "bob".into());

        assert!(queue.remove("survival", &"alice".into()));
        assert!(!queue.remove("survival", &"alice".into()));
        assert!(!queue.remove("creative", &"bob".into()));
        assert_eq!(queue.drain("survival"), vec![ClientId::from("bob")]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_pushes_are_not_lost() {
        let queue = Arc::new(PendingQueue::new());
        let tasks: Vec<_> = (0..200)
            .map(|i| {
                let queue = Arc::clone(&queue);
                tokio::spawn(async move {
                    queue.push("survival", ClientId::new(format!("player-{i}")));
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let drained = queue.drain("survival");
        assert_eq!(drained.len(), 200);
        let unique: HashSet<_> = drained.into_iter().collect();
        assert_eq!(unique.len(), 200);
        assert!(queue.drain("survival").is_empty());
    }
}
