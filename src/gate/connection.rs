//! Per-attempt connection decisions.

use std::sync::Arc;

use crate::fleet::LifecycleCoordinator;
use crate::gate::decision::{ConnectAttempt, ConnectOutcome, DenyReason, GateDecision};
use crate::modes::{ModeRegistry, OperatingMode};
use crate::observability::metrics;
use crate::router::{ClientId, Roster};

/// Decides what happens to connect attempts that target managed backends.
pub struct ConnectionGate {
    modes: Arc<ModeRegistry>,
    coordinator: Arc<LifecycleCoordinator>,
    roster: Arc<dyn Roster>,
    /// Lobby backend used as a redirect target.
    fallback: Option<String>,
}

impl ConnectionGate {
    pub fn new(
        modes: Arc<ModeRegistry>,
        coordinator: Arc<LifecycleCoordinator>,
        roster: Arc<dyn Roster>,
        fallback: Option<String>,
    ) -> Self {
        Self {
            modes,
            coordinator,
            roster,
            fallback,
        }
    }

    /// Decide a router-intercepted attempt.
    ///
    /// Never blocks on a start: the auto-start branch queues the client,
    /// fires the start in the background and answers immediately.
    pub async fn on_connect(&self, attempt: &ConnectAttempt) -> GateDecision {
        let decision = self.decide(attempt).await;
        metrics::record_gate_decision(decision.metric_label());
        tracing::debug!(
            client = %attempt.client,
            backend = %attempt.target,
            decision = decision.metric_label(),
            "Gate decision"
        );
        decision
    }

    async fn decide(&self, attempt: &ConnectAttempt) -> GateDecision {
        let id = attempt.target.as_str();
        if !self.coordinator.is_managed(id) {
            return GateDecision::Allow;
        }

        self.coordinator.activity().record_activity(id);

        let mode = self.modes.get(id);
        if mode != OperatingMode::HardForceOff && self.coordinator.is_online(id).await {
            return GateDecision::Allow;
        }

        if !mode.allows_auto_start() {
            let redirect_to = self.fallback_for(attempt).await;
            let message = match &redirect_to {
                Some(lobby) => format!("{id} is currently disabled. Redirecting to {lobby}."),
                None => format!("{id} is currently disabled."),
            };
            tracing::info!(client = %attempt.client, backend = %id, mode = %mode, "Denied connect to disabled backend");
            return GateDecision::Deny {
                reason: DenyReason::Disabled,
                redirect_to,
                message,
            };
        }

        // Queue before the watcher exists so its drain sees this client.
        if let Err(e) = self.coordinator.enqueue_pending(id, attempt.client.clone()) {
            tracing::warn!(backend = %id, error = %e, "Failed to queue client");
        }
        self.spawn_start(id, attempt.client.clone());
        self.coordinator.watch_startup(id);

        tracing::info!(client = %attempt.client, backend = %id, "Backend offline, starting and queueing client");
        GateDecision::Deny {
            reason: DenyReason::Starting,
            redirect_to: self.fallback_for(attempt).await,
            message: format!("{id} is starting up. You will be connected automatically when ready."),
        }
    }

    /// Fire-and-forget start. On failure the requesting client leaves the
    /// queue and is told directly.
    fn spawn_start(&self, id: &str, client: ClientId) {
        let coordinator = Arc::clone(&self.coordinator);
        let roster = Arc::clone(&self.roster);
        let id = id.to_string();
        tokio::spawn(async move {
            if coordinator.start(&id).await.is_err() {
                coordinator.cancel_pending(&id, &client);
                roster
                    .notify(&client, &format!("Could not start {id}. Please try again later."))
                    .await;
            }
        });
    }

    /// The lobby, if configured, reachable, and not where the client already is.
    async fn fallback_for(&self, attempt: &ConnectAttempt) -> Option<String> {
        let lobby = self.fallback.as_deref()?;
        if lobby == attempt.target || attempt.current.as_deref() == Some(lobby) {
            return None;
        }
        if !self.coordinator.is_online(lobby).await {
            tracing::warn!(lobby = %lobby, "Fallback backend is not reachable");
            return None;
        }
        Some(lobby.to_string())
    }

    /// Explicit "connect me to X": starts and waits when needed.
    ///
    /// Unlike [`on_connect`](Self::on_connect) this holds the caller until the
    /// backend is online or the start window runs out.
    pub async fn request_connect(&self, client: &ClientId, id: &str) -> ConnectOutcome {
        let backend = id.to_string();
        if !self.coordinator.is_managed(id) {
            return ConnectOutcome::Unknown { backend };
        }

        self.coordinator.activity().record_activity(id);

        let mode = self.modes.get(id);
        if mode != OperatingMode::HardForceOff && self.coordinator.is_online(id).await {
            return self.transfer(client, id).await;
        }

        if !mode.allows_auto_start() {
            return ConnectOutcome::Disabled { backend };
        }

        self.roster
            .notify(client, &format!("{id} is currently starting. You will be connected automatically."))
            .await;

        if self.coordinator.start(id).await.is_err() {
            return ConnectOutcome::Failed {
                backend,
                reason: "the start request failed".to_string(),
            };
        }

        let settings = self.coordinator.settings();
        match self
            .coordinator
            .wait_until_online(id, settings.max_start_wait, settings.poll_interval)
            .await
        {
            Ok(true) => {
                self.coordinator.activity().record_activity(id);
                self.transfer(client, id).await
            }
            _ => {
                tracing::warn!(client = %client, backend = %id, "Backend did not start in time");
                ConnectOutcome::StartTimeout { backend }
            }
        }
    }

    async fn transfer(&self, client: &ClientId, id: &str) -> ConnectOutcome {
        match self.roster.relocate(client, id).await {
            Ok(()) => ConnectOutcome::Connected { backend: id.to_string() },
            Err(e) => {
                tracing::warn!(client = %client, backend = %id, error = %e, "Transfer failed");
                ConnectOutcome::Failed {
                    backend: id.to_string(),
                    reason: "the router is unavailable".to_string(),
                }
            }
        }
    }
}

impl std::fmt::Debug for ConnectionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionGate")
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}
