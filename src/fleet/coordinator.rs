//! Start/stop orchestration, liveness checks and the pending-connection queue.
//!
//! # Responsibilities
//! - Gate every remote call on the managed set
//! - Derive online status from the liveness probe, never from control receipts
//! - Deliver queued clients exactly once per online transition

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashSet;
use tokio::time::{self, MissedTickBehavior};

use crate::config::FleetConfig;
use crate::control::{ActionReceipt, ControlAction, ControlPlane};
use crate::fleet::activity::ActivityTracker;
use crate::fleet::backend::{BackendDescriptor, BackendSet};
use crate::fleet::error::{FleetError, FleetResult};
use crate::fleet::pending::PendingQueue;
use crate::health::LivenessProbe;
use crate::observability::metrics;
use crate::router::{ClientId, Roster};

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Timing knobs used by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorSettings {
    /// Deadline applied to each liveness probe.
    pub probe_timeout: Duration,
    /// How long a readiness watcher waits for a started backend.
    pub max_start_wait: Duration,
    /// Interval between readiness probes.
    pub poll_interval: Duration,
}

impl CoordinatorSettings {
    pub fn from_config(config: &FleetConfig) -> Self {
        Self {
            probe_timeout: Duration::from_secs(config.probe.timeout_secs),
            max_start_wait: Duration::from_secs(config.startup.max_wait_secs),
            poll_interval: Duration::from_secs(config.startup.poll_interval_secs),
        }
    }
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_secs(3),
            max_start_wait: Duration::from_secs(120),
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// Outcome of a best-effort bulk relocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelocationSummary {
    pub moved: usize,
    pub failed: usize,
}

/// Orchestrates the lifecycle of managed backends.
pub struct LifecycleCoordinator {
    backends: BackendSet,
    control: Arc<dyn ControlPlane>,
    probe: Arc<dyn LivenessProbe>,
    roster: Arc<dyn Roster>,
    activity: Arc<ActivityTracker>,
    pending: PendingQueue,
    /// Backends with a readiness watcher in flight.
    watchers: DashSet<String>,
    settings: CoordinatorSettings,
}

impl LifecycleCoordinator {
    pub fn new(
        backends: BackendSet,
        control: Arc<dyn ControlPlane>,
        probe: Arc<dyn LivenessProbe>,
        roster: Arc<dyn Roster>,
        activity: Arc<ActivityTracker>,
        settings: CoordinatorSettings,
    ) -> Self {
        Self {
            backends,
            control,
            probe,
            roster,
            activity,
            pending: PendingQueue::new(),
            watchers: DashSet::new(),
            settings,
        }
    }

    pub fn backends(&self) -> &BackendSet {
        &self.backends
    }

    pub fn activity(&self) -> &ActivityTracker {
        &self.activity
    }

    pub fn settings(&self) -> CoordinatorSettings {
        self.settings
    }

    pub fn is_managed(&self, id: &str) -> bool {
        self.backends.contains(id)
    }

    pub fn descriptor(&self, id: &str) -> FleetResult<&BackendDescriptor> {
        self.backends
            .get(id)
            .ok_or_else(|| FleetError::NotManaged(id.to_string()))
    }

    /// Probe a backend. Works for any router-known id, managed or not.
    ///
    /// Probe errors and timeouts resolve to `false`.
    pub async fn is_online(&self, id: &str) -> bool {
        let online = match time::timeout(self.settings.probe_timeout, self.probe.probe(id)).await {
            Ok(Ok(Some(ping))) => {
                tracing::trace!(backend = %id, latency_ms = ping.latency.as_millis() as u64, "Probe answered");
                true
            }
            Ok(Ok(None)) => false,
            Ok(Err(e)) => {
                tracing::debug!(backend = %id, error = %e, "Probe failed");
                false
            }
            Err(_) => {
                tracing::debug!(backend = %id, "Probe timed out");
                false
            }
        };
        metrics::record_backend_online(id, online);
        online
    }

    /// Ask the control plane to start a backend. Does not wait for readiness.
    pub async fn start(&self, id: &str) -> FleetResult<()> {
        self.dispatch(id, ControlAction::Start).await
    }

    /// Ask the control plane to stop a backend.
    pub async fn stop(&self, id: &str) -> FleetResult<()> {
        self.dispatch(id, ControlAction::Stop).await
    }

    async fn dispatch(&self, id: &str, action: ControlAction) -> FleetResult<()> {
        let descriptor = self.descriptor(id)?;

        match self.control.dispatch(&descriptor.remote_id, action).await {
            Ok(ActionReceipt::Accepted) => {
                tracing::info!(backend = %id, action = %action, "Control request accepted");
                metrics::record_control_action(action, "accepted");
                Ok(())
            }
            Ok(ActionReceipt::Rejected { status }) => {
                tracing::warn!(
                    backend = %id,
                    action = %action,
                    status,
                    "Control request rejected; outcome unknown"
                );
                metrics::record_control_action(action, "rejected");
                Ok(())
            }
            Err(e) => {
                tracing::error!(backend = %id, action = %action, error = %e, "Control request failed");
                metrics::record_control_action(action, "failed");
                Err(e.into())
            }
        }
    }

    /// Poll until the backend answers or `timeout` elapses.
    ///
    /// The first probe runs immediately. The poll timer is owned by the
    /// returned future and dropped with it.
    pub async fn wait_until_online(
        &self,
        id: &str,
        timeout: Duration,
        poll_interval: Duration,
    ) -> FleetResult<bool> {
        self.descriptor(id)?;

        let poll = async {
            let mut ticker = time::interval(poll_interval.max(MIN_POLL_INTERVAL));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if self.is_online(id).await {
                    return;
                }
            }
        };

        let online = time::timeout(timeout, poll).await.is_ok();
        tracing::debug!(backend = %id, online, "Finished waiting for backend");
        Ok(online)
    }

    /// Queue a client for delivery once the backend is online.
    pub fn enqueue_pending(&self, id: &str, client: ClientId) -> FleetResult<usize> {
        self.descriptor(id)?;
        let waiting = self.pending.push(id, client);
        metrics::record_pending(id, waiting);
        Ok(waiting)
    }

    /// Drop one client from the queue, e.g. after its start request failed.
    pub fn cancel_pending(&self, id: &str, client: &ClientId) -> bool {
        let removed = self.pending.remove(id, client);
        if removed {
            metrics::record_pending(id, self.pending.len(id));
        }
        removed
    }

    /// Atomically take every queued client.
    pub fn drain_pending(&self, id: &str) -> Vec<ClientId> {
        let drained = self.pending.drain(id);
        metrics::record_pending(id, 0);
        drained
    }

    pub fn pending_count(&self, id: &str) -> usize {
        self.pending.len(id)
    }

    pub async fn player_count(&self, id: &str) -> usize {
        self.roster.players_on(id).await
    }

    /// Move every attached client to `destination`. Failures are counted, not raised.
    pub async fn relocate_all(&self, id: &str, destination: &str) -> RelocationSummary {
        let mut summary = RelocationSummary::default();

        for client in self.roster.clients_on(id).await {
            match self.roster.relocate(&client, destination).await {
                Ok(()) => summary.moved += 1,
                Err(e) => {
                    tracing::warn!(
                        backend = %id,
                        client = %client,
                        destination = %destination,
                        error = %e,
                        "Failed to relocate client"
                    );
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            backend = %id,
            destination = %destination,
            moved = summary.moved,
            failed = summary.failed,
            "Relocated clients"
        );
        summary
    }

    /// Handle one "became online" event: record activity, drain once, transfer.
    ///
    /// Returns the number of clients handed to the router.
    pub async fn deliver_pending(&self, id: &str) -> usize {
        self.activity.record_activity(id);

        let clients = self.drain_pending(id);
        if clients.is_empty() {
            return 0;
        }

        let mut delivered = 0;
        for client in &clients {
            match self.roster.relocate(client, id).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(backend = %id, client = %client, error = %e, "Failed to deliver queued client");
                }
            }
        }

        metrics::record_pending_delivered(id, delivered);
        tracing::info!(backend = %id, queued = clients.len(), delivered, "Delivered queued clients");
        delivered
    }

    /// Spawn a readiness watcher for a backend unless one is already running.
    ///
    /// Returns `true` if a watcher was spawned.
    pub fn watch_startup(self: &Arc<Self>, id: &str) -> bool {
        if !self.is_managed(id) || !self.watchers.insert(id.to_string()) {
            return false;
        }

        let coordinator = Arc::clone(self);
        let id = id.to_string();
        tokio::spawn(async move {
            let CoordinatorSettings { max_start_wait, poll_interval, .. } = coordinator.settings;
            let online = coordinator
                .wait_until_online(&id, max_start_wait, poll_interval)
                .await
                .unwrap_or(false);

            // Drain before unregistering; late arrivals are picked up on release.
            if online {
                coordinator.deliver_pending(&id).await;
                coordinator.release_watcher(&id);
                return;
            }

            let stranded = coordinator.drain_pending(&id);
            coordinator.release_watcher(&id);
            tracing::warn!(
                backend = %id,
                waited_secs = max_start_wait.as_secs(),
                stranded = stranded.len(),
                "Backend did not come online in time"
            );
            let text = format!("{id} did not start in time. Please try again.");
            for client in &stranded {
                coordinator.roster.notify(client, &text).await;
            }
        });
        true
    }

    /// Unregister a finished watcher. Clients queued after its drain get a new one.
    fn release_watcher(self: &Arc<Self>, id: &str) {
        self.watchers.remove(id);
        if self.pending.len(id) > 0 {
            tracing::debug!(backend = %id, "Clients queued after drain, rewatching");
            self.watch_startup(id);
        }
    }

    pub fn is_watching(&self, id: &str) -> bool {
        self.watchers.contains(id)
    }
}

impl std::fmt::Debug for LifecycleCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleCoordinator")
            .field("backends", &self.backends)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::ControlError;
    use crate::health::PingResult;
    use crate::router::RouterError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingControl {
        calls: AtomicUsize,
        reject: AtomicBool,
    }

    #[async_trait]
    impl ControlPlane for CountingControl {
        async fn dispatch(&self, _remote_id: &str, _action: ControlAction) -> Result<ActionReceipt, ControlError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.reject.load(Ordering::SeqCst) {
                Ok(ActionReceipt::Rejected { status: 500 })
            } else {
                Ok(ActionReceipt::Accepted)
            }
        }
    }

    #[derive(Default)]
    struct SwitchProbe {
        online: AtomicBool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LivenessProbe for SwitchProbe {
        async fn probe(&self, backend_id: &str) -> Result<Option<PingResult>, RouterError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if backend_id == "broken" {
                return Err(RouterError::UnknownServer(backend_id.to_string()));
            }
            Ok(self
                .online
                .load(Ordering::SeqCst)
                .then_some(PingResult { latency: Duration::from_millis(1) }))
        }
    }

    #[derive(Default)]
    struct ListRoster {
        clients: Vec<ClientId>,
        moves: Mutex<Vec<(ClientId, String)>>,
    }

    #[async_trait]
    impl Roster for ListRoster {
        async fn players_on(&self, _backend_id: &str) -> usize {
            self.clients.len()
        }

        async fn clients_on(&self, _backend_id: &str) -> Vec<ClientId> {
            self.clients.clone()
        }

        async fn relocate(&self, client: &ClientId, destination: &str) -> Result<(), RouterError> {
            if client.as_str() == "ghost" {
                return Err(RouterError::Disconnected);
            }
            self.moves.lock().unwrap().push((client.clone(), destination.to_string()));
            Ok(())
        }

        async fn notify(&self, _client: &ClientId, _text: &str) {}
    }

    fn coordinator(
        control: Arc<CountingControl>,
        probe: Arc<SwitchProbe>,
        roster: Arc<ListRoster>,
    ) -> LifecycleCoordinator {
        let backends = BackendSet::new([BackendDescriptor::new(
            "survival",
            "uuid-survival",
            Duration::from_secs(300),
        )]);
        LifecycleCoordinator::new(
            backends,
            control,
            probe,
            roster,
            Arc::new(ActivityTracker::new()),
            CoordinatorSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_unmanaged_ids_make_no_calls() {
        let control = Arc::new(CountingControl::default());
        let probe = Arc::new(SwitchProbe::default());
        let coordinator = coordinator(control.clone(), probe.clone(), Arc::default());

        assert!(matches!(coordinator.start("nether").await, Err(FleetError::NotManaged(_))));
        assert!(matches!(coordinator.stop("nether").await, Err(FleetError::NotManaged(_))));
        assert!(matches!(
            coordinator.wait_until_online("nether", Duration::from_secs(1), Duration::from_millis(100)).await,
            Err(FleetError::NotManaged(_))
        ));
        assert!(coordinator.enqueue_pending("nether", "alice".into()).is_err());

        assert_eq!(control.calls.load(Ordering::SeqCst), 0);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rejected_request_still_resolves() {
        let control = Arc::new(CountingControl::default());
        control.reject.store(true, Ordering::SeqCst);
        let coordinator = coordinator(control.clone(), Arc::default(), Arc::default());

        coordinator.start("survival").await.unwrap();
        assert_eq!(control.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_probe_errors_are_offline() {
        let coordinator = coordinator(Arc::default(), Arc::default(), Arc::default());
        assert!(!coordinator.is_online("broken").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_online_times_out() {
        let probe = Arc::new(SwitchProbe::default());
        let coordinator = coordinator(Arc::default(), probe.clone(), Arc::default());

        let started = time::Instant::now();
        let online = coordinator
            .wait_until_online("survival", Duration::from_secs(10), Duration::from_secs(2))
            .await
            .unwrap();

        assert!(!online);
        assert!(started.elapsed() >= Duration::from_secs(10));
        assert!(started.elapsed() < Duration::from_secs(12));
        let polls = probe.calls.load(Ordering::SeqCst);

        time::advance(Duration::from_secs(30)).await;
        assert_eq!(probe.calls.load(Ordering::SeqCst), polls);
    }

    #[tokio::test]
    async fn test_relocate_all_counts_failures() {
        let roster = Arc::new(ListRoster {
            clients: vec!["alice".into(), "ghost".into(), "bob".into()],
            ..Default::default()
        });
        let coordinator = coordinator(Arc::default(), Arc::default(), roster.clone());

        let summary = coordinator.relocate_all("survival", "lobby").await;
        assert_eq!(summary, RelocationSummary { moved: 2, failed: 1 });
        assert_eq!(roster.moves.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_deliver_pending_drains_once() {
        let roster = Arc::new(ListRoster::default());
        let coordinator = coordinator(Arc::default(), Arc::default(), roster.clone());
        coordinator.enqueue_pending("survival", "alice".into()).unwrap();
        coordinator.enqueue_pending("survival", "bob".into()).unwrap();

        assert_eq!(coordinator.deliver_pending("survival").await, 2);
        assert_eq!(coordinator.deliver_pending("survival").await, 0);
        assert_eq!(
            *roster.moves.lock().unwrap(),
            vec![
                (ClientId::from("alice"), "survival".to_string()),
                (ClientId::from("bob"), "survival".to_string()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_queued_during_drain_gets_new_watcher() {
        let coordinator = Arc::new(coordinator(Arc::default(), Arc::default(), Arc::default()));
        coordinator.watchers.insert("survival".to_string());

        // Arrives after the finishing watcher drained but before it unregistered.
        coordinator.enqueue_pending("survival", "bob".into()).unwrap();
        assert!(!coordinator.watch_startup("survival"));

        coordinator.release_watcher("survival");
        assert!(coordinator.is_watching("survival"));
        assert_eq!(coordinator.pending_count("survival"), 1);
    }

    #[tokio::test]
    async fn test_release_without_waiting_clients_unregisters() {
        let coordinator = Arc::new(coordinator(Arc::default(), Arc::default(), Arc::default()));
        coordinator.watchers.insert("survival".to_string());

        coordinator.release_watcher("survival");
        assert!(!coordinator.is_watching("survival"));
    }

    #[tokio::test]
    async fn test_cancel_pending_removes_one_client() {
        let coordinator = coordinator(Arc::default(), Arc::default(), Arc::default());
        coordinator.enqueue_pending("survival", "alice".into()).unwrap();
        coordinator.enqueue_pending("survival", "bob".into()).unwrap();

        assert!(coordinator.cancel_pending("survival", &"alice".into()));
        assert!(!coordinator.cancel_pending("survival", &"alice".into()));
        assert_eq!(coordinator.drain_pending("survival"), vec![ClientId::from("bob")]);
    }
}
