//! Shared fakes and fixtures for integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast::{self, error::TryRecvError};

use lazy_fleet::config::{loader::parse_config, FleetConfig};
use lazy_fleet::control::{ActionReceipt, ControlAction, ControlError, ControlPlane};
use lazy_fleet::health::{LivenessProbe, PingResult};
use lazy_fleet::lifecycle::Fleet;
use lazy_fleet::modes::ModeRegistry;
use lazy_fleet::router::{ClientId, DirectiveKind, RouterDirective, RouterError, SessionRoster};

pub const FLEET_TOML: &str = r#"
[control]
base_url = "http://127.0.0.1:8000"
api_token = "test-token"

[fallback]
backend = "lobby"
relocate_on_stop = true

[idle]
check_interval_secs = 30
default_timeout_secs = 600

[startup]
poll_interval_secs = 2
max_wait_secs = 120

[admin]
api_key = "test-key"

[[backends]]
id = "lobby"
address = "127.0.0.1:25565"

[[backends]]
id = "survival"
remote_id = "uuid-survival"
idle_timeout_secs = 300

[[backends]]
id = "creative"
remote_id = "uuid-creative"
idle_timeout_secs = 300
"#;

pub fn test_config() -> FleetConfig {
    parse_config(FLEET_TOML).unwrap()
}

/// How the fake control plane answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlBehavior {
    Accept,
    Reject(u16),
    Unreachable,
}

/// Control plane double that records every dispatched action.
pub struct FakeControl {
    behavior: Mutex<ControlBehavior>,
    calls: Mutex<Vec<(String, ControlAction)>>,
}

impl FakeControl {
    pub fn new() -> Self {
        Self {
            behavior: Mutex::new(ControlBehavior::Accept),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_behavior(&self, behavior: ControlBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn calls(&self) -> Vec<(String, ControlAction)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, remote_id: &str, action: ControlAction) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, a)| id == remote_id && *a == action)
            .count()
    }
}

#[async_trait]
impl ControlPlane for FakeControl {
    async fn dispatch(&self, remote_id: &str, action: ControlAction) -> Result<ActionReceipt, ControlError> {
        self.calls.lock().unwrap().push((remote_id.to_string(), action));
        match *self.behavior.lock().unwrap() {
            ControlBehavior::Accept => Ok(ActionReceipt::Accepted),
            ControlBehavior::Reject(status) => Ok(ActionReceipt::Rejected { status }),
            ControlBehavior::Unreachable => Err(ControlError::Timeout(10)),
        }
    }
}

/// Liveness probe double with a switchable online set.
pub struct FakeProbe {
    online: Mutex<HashSet<String>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl FakeProbe {
    pub fn new() -> Self {
        Self {
            online: Mutex::new(HashSet::new()),
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn set_online(&self, id: &str, online: bool) {
        let mut set = self.online.lock().unwrap();
        if online {
            set.insert(id.to_string());
        } else {
            set.remove(id);
        }
    }

    pub fn calls(&self, id: &str) -> usize {
        self.calls.lock().unwrap().get(id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl LivenessProbe for FakeProbe {
    async fn probe(&self, backend_id: &str) -> Result<Option<PingResult>, RouterError> {
        *self.calls.lock().unwrap().entry(backend_id.to_string()).or_default() += 1;
        let online = self.online.lock().unwrap().contains(backend_id);
        Ok(online.then_some(PingResult { latency: Duration::from_millis(2) }))
    }
}

/// A fully wired fleet around fakes, with a subscribed "router".
pub struct Harness {
    pub fleet: Arc<Fleet>,
    pub control: Arc<FakeControl>,
    pub probe: Arc<FakeProbe>,
    directives: broadcast::Receiver<RouterDirective>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_parts(test_config(), Arc::new(ModeRegistry::in_memory()))
    }

    pub fn with_parts(config: FleetConfig, modes: Arc<ModeRegistry>) -> Self {
        let control = Arc::new(FakeControl::new());
        let probe = Arc::new(FakeProbe::new());
        let sessions = Arc::new(SessionRoster::new());
        let directives = sessions.subscribe();
        let fleet = Fleet::with_collaborators(config, modes, control.clone(), probe.clone(), sessions);

        Self {
            fleet: Arc::new(fleet),
            control,
            probe,
            directives,
        }
    }

    /// Everything published to the router since the last call.
    pub fn directives(&mut self) -> Vec<DirectiveKind> {
        let mut out = Vec::new();
        loop {
            match self.directives.try_recv() {
                Ok(directive) => out.push(directive.kind),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        out
    }

    pub fn transfers(&mut self) -> Vec<(ClientId, String)> {
        self.directives()
            .into_iter()
            .filter_map(|kind| match kind {
                DirectiveKind::Transfer { client, backend } => Some((client, backend)),
                DirectiveKind::Message { .. } => None,
            })
            .collect()
    }
}

/// Let spawned tasks run without advancing time.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
