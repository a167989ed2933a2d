//! Operator command surface.
//!
//! Mirrors the in-game commands: view/set mode, explicit start/stop, and
//! connect. Every reply is a short human-readable line; raw error detail
//! only goes to the log.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::fleet::{FleetResult, LifecycleCoordinator};
use crate::gate::ConnectionGate;
use crate::modes::{ModeRegistry, OperatingMode};
use crate::router::ClientId;

/// Result of an operator command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandReply {
    pub ok: bool,
    pub message: String,
}

impl CommandReply {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { ok: true, message: message.into() }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { ok: false, message: message.into() }
    }
}

pub struct FleetCommands {
    modes: Arc<ModeRegistry>,
    coordinator: Arc<LifecycleCoordinator>,
    gate: Arc<ConnectionGate>,
    /// Lobby that players are moved to before a forced stop.
    relocate_to: Option<String>,
    enforce_hard_modes: bool,
}

impl FleetCommands {
    pub fn new(
        modes: Arc<ModeRegistry>,
        coordinator: Arc<LifecycleCoordinator>,
        gate: Arc<ConnectionGate>,
        relocate_to: Option<String>,
        enforce_hard_modes: bool,
    ) -> Self {
        Self {
            modes,
            coordinator,
            gate,
            relocate_to,
            enforce_hard_modes,
        }
    }

    pub fn mode(&self, id: &str) -> FleetResult<OperatingMode> {
        self.coordinator.descriptor(id)?;
        Ok(self.modes.get(id))
    }

    /// Persist a mode and, for hard modes, act on it immediately.
    ///
    /// A failed save keeps the in-memory mode and reports `ok: false`.
    pub async fn set_mode(&self, id: &str, mode: OperatingMode) -> FleetResult<CommandReply> {
        self.coordinator.descriptor(id)?;

        let saved = self.modes.set(id, mode);
        if let Err(e) = &saved {
            tracing::error!(backend = %id, mode = %mode, error = %e, "Failed to persist mode");
        }

        let effect = if self.enforce_hard_modes {
            self.enforce(id, mode).await
        } else {
            None
        };

        let mut message = format!("Set {id} -> {mode}");
        if saved.is_err() {
            message.push_str(", but it could not be saved");
        }
        message.push('.');
        if let Some(effect) = effect {
            message.push(' ');
            message.push_str(&effect);
        }

        Ok(CommandReply { ok: saved.is_ok(), message })
    }

    async fn enforce(&self, id: &str, mode: OperatingMode) -> Option<String> {
        match mode {
            OperatingMode::HardForceOn => {
                if self.coordinator.is_online(id).await {
                    return None;
                }
                self.coordinator.activity().record_activity(id);
                Some(match self.coordinator.start(id).await {
                    Ok(()) => format!("Start requested for {id}."),
                    Err(_) => format!("Start failed for {id}."),
                })
            }
            OperatingMode::HardForceOff => Some(self.forced_stop(id).await.message),
            _ => None,
        }
    }

    /// Move players out, then stop and close the idle episode.
    async fn forced_stop(&self, id: &str) -> CommandReply {
        let moved = match &self.relocate_to {
            Some(lobby) => {
                let summary = self.coordinator.relocate_all(id, lobby).await;
                (summary.moved > 0).then(|| format!(" Moved {} players to {lobby}.", summary.moved))
            }
            None => None,
        };

        match self.coordinator.stop(id).await {
            Ok(()) => {
                self.coordinator.activity().mark_stopped(id);
                CommandReply::ok(format!("Stop requested for {id}.{}", moved.unwrap_or_default()))
            }
            Err(_) => CommandReply::failed(format!("Stop failed for {id}.{}", moved.unwrap_or_default())),
        }
    }

    /// Explicit start. Opens a fresh idle grace window.
    pub async fn start(&self, id: &str) -> FleetResult<CommandReply> {
        self.coordinator.descriptor(id)?;
        self.coordinator.activity().record_activity(id);

        Ok(match self.coordinator.start(id).await {
            Ok(()) => CommandReply::ok(format!("Start requested for {id}.")),
            Err(_) => CommandReply::failed(format!("Start failed for {id}.")),
        })
    }

    /// Explicit stop. Relocates players first when relocation is enabled.
    pub async fn stop(&self, id: &str) -> FleetResult<CommandReply> {
        self.coordinator.descriptor(id)?;

        Ok(self.forced_stop(id).await)
    }

    /// Direct connect request; waits for a start when needed.
    pub async fn connect(&self, client: &ClientId, id: &str) -> CommandReply {
        let outcome = self.gate.request_connect(client, id).await;
        CommandReply {
            ok: outcome.is_connected(),
            message: outcome.message(),
        }
    }
}

impl std::fmt::Debug for FleetCommands {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FleetCommands")
            .field("relocate_to", &self.relocate_to)
            .field("enforce_hard_modes", &self.enforce_hard_modes)
            .finish_non_exhaustive()
    }
}
