//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the fleet manager.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for lazy-fleet.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FleetConfig {
    /// Control plane (remote start/stop API) settings.
    pub control: ControlConfig,

    /// Fallback/lobby backend used to hold clients.
    pub fallback: FallbackConfig,

    /// Idle detection settings.
    pub idle: IdleConfig,

    /// Start-wait settings.
    pub startup: StartupConfig,

    /// Liveness probe settings.
    pub probe: ProbeConfig,

    /// Mode store settings.
    pub modes: ModesConfig,

    /// Admin and router-hook HTTP surface.
    pub admin: AdminConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Backend definitions, managed or not.
    pub backends: Vec<BackendConfig>,
}

impl FleetConfig {
    /// Find a backend definition by id.
    pub fn backend(&self, id: &str) -> Option<&BackendConfig> {
        self.backends.iter().find(|b| b.id == id)
    }
}

/// Remote control API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Base URL of the control API (e.g., "https://crafty.local:8443").
    pub base_url: String,

    /// Bearer token sent with every request.
    pub api_token: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            base_url: "https://localhost:8443".to_string(),
            api_token: String::new(),
            request_timeout_secs: 10,
        }
    }
}

/// Fallback (lobby) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Backend id clients are redirected to while their target is unavailable.
    pub backend: Option<String>,

    /// Move attached clients to the fallback after a forced or idle stop.
    pub relocate_on_stop: bool,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            backend: Some("lobby".to_string()),
            relocate_on_stop: true,
        }
    }
}

/// Idle detection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdleConfig {
    /// How often the idle monitor runs, in seconds.
    pub check_interval_secs: u64,

    /// Idle timeout for backends without an override, in seconds.
    pub default_timeout_secs: u64,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: 30,
            default_timeout_secs: 600,
        }
    }
}

/// Start-wait configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StartupConfig {
    /// Liveness poll interval while waiting for a backend to come up, in seconds.
    pub poll_interval_secs: u64,

    /// Maximum time to wait for a backend to come up, in seconds.
    pub max_wait_secs: u64,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 2,
            max_wait_secs: 120,
        }
    }
}

/// Liveness probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Probe timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self { timeout_secs: 3 }
    }
}

/// Mode store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ModesConfig {
    /// Path of the persisted mode map (JSON).
    pub state_file: String,

    /// Apply HARD_FORCE_ON / HARD_FORCE_OFF immediately when set.
    pub enforce_hard_modes: bool,
}

impl Default for ModesConfig {
    fn default() -> Self {
        Self {
            state_file: "modes.json".to_string(),
            enforce_hard_modes: true,
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Bind address for the admin API and router hooks.
    pub bind_address: String,

    /// Timeout for admin requests in seconds.
    pub request_timeout_secs: u64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Backend server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Unique backend identifier (router server name).
    pub id: String,

    /// Control plane instance id. Backends without one are known to the
    /// router but not lifecycle-managed (e.g. the lobby).
    #[serde(default)]
    pub remote_id: Option<String>,

    /// Backend address (e.g., "127.0.0.1:25566"), used by the liveness probe.
    #[serde(default)]
    pub address: Option<String>,

    /// Idle timeout override in seconds.
    #[serde(default)]
    pub idle_timeout_secs: Option<u64>,
}
