//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize all subsystems in dependency order
//! - Register background tasks (idle checks)
//!
//! # Design Decisions
//! - Fail fast: a control client that cannot be built is fatal
//! - A mode file that cannot be read is not; the fleet starts with defaults
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last, in `main`

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::commands::FleetCommands;
use crate::config::FleetConfig;
use crate::control::{ControlError, ControlPlane, RemoteControlClient};
use crate::fleet::{ActivityTracker, BackendSet, CoordinatorSettings, LifecycleCoordinator};
use crate::gate::ConnectionGate;
use crate::health::{LivenessProbe, TcpProbe};
use crate::idle::IdleMonitor;
use crate::lifecycle::scheduler::{Scheduler, TaskHandle};
use crate::modes::ModeRegistry;
use crate::router::{Roster, SessionRoster};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build control client: {0}")]
    Control(#[from] ControlError),
}

/// Every long-lived component, wired together.
#[derive(Debug)]
pub struct Fleet {
    pub config: Arc<FleetConfig>,
    pub modes: Arc<ModeRegistry>,
    pub sessions: Arc<SessionRoster>,
    pub coordinator: Arc<LifecycleCoordinator>,
    pub idle: Arc<IdleMonitor>,
    pub gate: Arc<ConnectionGate>,
    pub commands: Arc<FleetCommands>,
}

impl Fleet {
    /// Build the production wiring: HTTP control client, TCP probe,
    /// file-backed modes.
    pub fn build(config: FleetConfig) -> Result<Self, StartupError> {
        let control = Arc::new(RemoteControlClient::new(&config.control)?);
        let probe = Arc::new(TcpProbe::from_config(
            &config.backends,
            Duration::from_secs(config.probe.timeout_secs),
        ));
        let modes = Arc::new(ModeRegistry::open(config.modes.state_file.clone()));

        Ok(Self::with_collaborators(
            config,
            modes,
            control,
            probe,
            Arc::new(SessionRoster::new()),
        ))
    }

    /// Wire the fleet around the given collaborators.
    pub fn with_collaborators(
        config: FleetConfig,
        modes: Arc<ModeRegistry>,
        control: Arc<dyn ControlPlane>,
        probe: Arc<dyn LivenessProbe>,
        sessions: Arc<SessionRoster>,
    ) -> Self {
        let roster: Arc<dyn Roster> = sessions.clone();
        let backends = BackendSet::from_config(&config);
        tracing::info!(managed = backends.len(), "Managed backends loaded");
        modes.retain_known(|id| backends.contains(id));

        let coordinator = Arc::new(LifecycleCoordinator::new(
            backends,
            control,
            probe,
            roster.clone(),
            Arc::new(ActivityTracker::new()),
            CoordinatorSettings::from_config(&config),
        ));

        let lobby = config.fallback.backend.clone();
        let relocate_to = lobby.clone().filter(|_| config.fallback.relocate_on_stop);

        let idle = Arc::new(IdleMonitor::new(
            modes.clone(),
            coordinator.clone(),
            relocate_to.clone(),
            Duration::from_secs(config.idle.check_interval_secs),
        ));
        let gate = Arc::new(ConnectionGate::new(
            modes.clone(),
            coordinator.clone(),
            roster,
            lobby,
        ));
        let commands = Arc::new(FleetCommands::new(
            modes.clone(),
            coordinator.clone(),
            gate.clone(),
            relocate_to,
            config.modes.enforce_hard_modes,
        ));

        Self {
            config: Arc::new(config),
            modes,
            sessions,
            coordinator,
            idle,
            gate,
            commands,
        }
    }

    /// Register periodic work. Cancel the returned handles on shutdown.
    pub fn start_background(&self, scheduler: &dyn Scheduler) -> Vec<TaskHandle> {
        vec![self.idle.schedule(scheduler)]
    }
}
