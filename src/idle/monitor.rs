//! The idle-shutdown control loop.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;

use crate::fleet::LifecycleCoordinator;
use crate::lifecycle::scheduler::{Scheduler, TaskHandle};
use crate::modes::ModeRegistry;
use crate::observability::metrics;

/// What one tick decided for one backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleVerdict {
    /// Mode forbids idle shutdown.
    Exempt,
    /// A stop was issued in this idle episode and the backend is down,
    /// or the stop is too recent to re-check.
    AlreadyStopped,
    /// Idle time is below the threshold.
    Active { idle: Duration },
    /// Players are attached; the clock was reset.
    Occupied { players: usize },
    /// Stop was issued and accepted.
    Stopped { relocated: usize },
    /// Stop failed; the next tick retries.
    StopFailed,
}

/// Per-backend verdicts from one tick, in backend id order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdleReport {
    pub verdicts: Vec<(String, IdleVerdict)>,
}

impl IdleReport {
    pub fn verdict(&self, id: &str) -> Option<IdleVerdict> {
        self.verdicts
            .iter()
            .find(|(backend, _)| backend == id)
            .map(|(_, verdict)| *verdict)
    }

    pub fn stopped(&self) -> impl Iterator<Item = &str> {
        self.verdicts
            .iter()
            .filter(|(_, verdict)| matches!(verdict, IdleVerdict::Stopped { .. }))
            .map(|(backend, _)| backend.as_str())
    }
}

/// Stops managed backends that have been empty for longer than their idle timeout.
#[derive(Debug)]
pub struct IdleMonitor {
    modes: Arc<ModeRegistry>,
    coordinator: Arc<LifecycleCoordinator>,
    /// Relocation target after a stop, if relocation is enabled.
    relocate_to: Option<String>,
    check_interval: Duration,
}

impl IdleMonitor {
    pub fn new(
        modes: Arc<ModeRegistry>,
        coordinator: Arc<LifecycleCoordinator>,
        relocate_to: Option<String>,
        check_interval: Duration,
    ) -> Self {
        Self {
            modes,
            coordinator,
            relocate_to,
            check_interval,
        }
    }

    pub fn check_interval(&self) -> Duration {
        self.check_interval
    }

    /// Check every managed backend once, concurrently.
    pub async fn tick(&self) -> IdleReport {
        let checks = self
            .coordinator
            .backends()
            .ids()
            .map(|id| async move { (id.to_string(), self.check_backend(id).await) });

        let report = IdleReport {
            verdicts: join_all(checks).await,
        };
        tracing::debug!(report = ?report.verdicts, "Idle check complete");
        report
    }

    /// Run the idle decision for a single backend.
    pub async fn check_backend(&self, id: &str) -> IdleVerdict {
        if !self.modes.allows_idle_shutdown(id) {
            return IdleVerdict::Exempt;
        }

        let Ok(descriptor) = self.coordinator.descriptor(id) else {
            return IdleVerdict::Exempt;
        };

        // A control receipt never confirms the stop. Once another full timeout
        // has passed, a backend the probe still sees is stopped again.
        let activity = self.coordinator.activity();
        if let Some(since_stop) = activity.since_stop(id) {
            if since_stop < descriptor.idle_timeout || !self.coordinator.is_online(id).await {
                return IdleVerdict::AlreadyStopped;
            }
            tracing::warn!(backend = %id, since_stop_secs = since_stop.as_secs(), "Backend still online after stop");
        }

        let idle = activity.idle_for(id);
        if idle < descriptor.idle_timeout {
            return IdleVerdict::Active { idle };
        }

        let players = self.coordinator.player_count(id).await;
        if players > 0 {
            activity.record_activity(id);
            return IdleVerdict::Occupied { players };
        }

        tracing::info!(backend = %id, idle_secs = idle.as_secs(), "Stopping idle backend");

        if let Err(e) = self.coordinator.stop(id).await {
            tracing::warn!(backend = %id, error = %e, "Idle stop failed, retrying next check");
            metrics::record_idle_stop(id, "failed");
            return IdleVerdict::StopFailed;
        }

        activity.mark_stopped(id);
        metrics::record_idle_stop(id, "stopped");

        let relocated = match &self.relocate_to {
            Some(lobby) => self.coordinator.relocate_all(id, lobby).await.moved,
            None => 0,
        };
        IdleVerdict::Stopped { relocated }
    }

    /// Register the periodic check with a scheduler.
    pub fn schedule(self: &Arc<Self>, scheduler: &dyn Scheduler) -> TaskHandle {
        let monitor = Arc::clone(self);
        tracing::info!(interval_secs = self.check_interval.as_secs(), "Scheduling idle checks");
        scheduler.register(
            self.check_interval,
            Box::new(move || {
                let monitor = Arc::clone(&monitor);
                Box::pin(async move {
                    monitor.tick().await;
                })
            }),
        )
    }
}
