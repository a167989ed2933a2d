//! Operating modes and their fixed policy table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Per-backend policy override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperatingMode {
    /// Auto-start on demand, stop when idle.
    #[default]
    Standard,
    /// Auto-start, never idle-stop; resets to Standard on restart.
    SoftForceOn,
    /// Auto-start, never idle-stop; survives restarts.
    HardForceOn,
    /// No auto-start, idle-stop allowed; resets to Standard on restart.
    SoftForceOff,
    /// Never auto-start, never idle-stop; survives restarts.
    HardForceOff,
}

/// Policy booleans attached to a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModePolicy {
    pub allow_auto_start: bool,
    pub allow_idle_shutdown: bool,
    pub persistent: bool,
}

const fn policy(allow_auto_start: bool, allow_idle_shutdown: bool, persistent: bool) -> ModePolicy {
    ModePolicy { allow_auto_start, allow_idle_shutdown, persistent }
}

/// Indexed by `OperatingMode as usize`.
const POLICY_TABLE: [ModePolicy; 5] = [
    policy(true, true, true),    // Standard
    policy(true, false, false),  // SoftForceOn
    policy(true, false, true),   // HardForceOn
    policy(false, true, false),  // SoftForceOff
    policy(false, false, true),  // HardForceOff
];

impl OperatingMode {
    pub const ALL: [OperatingMode; 5] = [
        OperatingMode::Standard,
        OperatingMode::SoftForceOn,
        OperatingMode::HardForceOn,
        OperatingMode::SoftForceOff,
        OperatingMode::HardForceOff,
    ];

    pub const fn policy(self) -> ModePolicy {
        POLICY_TABLE[self as usize]
    }

    pub const fn allows_auto_start(self) -> bool {
        self.policy().allow_auto_start
    }

    pub const fn allows_idle_shutdown(self) -> bool {
        self.policy().allow_idle_shutdown
    }

    pub const fn is_persistent(self) -> bool {
        self.policy().persistent
    }

    /// Canonical persisted name.
    pub const fn as_str(self) -> &'static str {
        match self {
            OperatingMode::Standard => "STANDARD",
            OperatingMode::SoftForceOn => "SOFT_FORCE_ON",
            OperatingMode::HardForceOn => "HARD_FORCE_ON",
            OperatingMode::SoftForceOff => "SOFT_FORCE_OFF",
            OperatingMode::HardForceOff => "HARD_FORCE_OFF",
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a mode name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mode '{0}'")]
pub struct UnknownMode(pub String);

impl FromStr for OperatingMode {
    type Err = UnknownMode;

    /// Case-insensitive; `-` and `_` are interchangeable.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        OperatingMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| UnknownMode(s.to_string()))
    }
}
