//! Lifecycle error types.

use thiserror::Error;

use crate::control::ControlError;

/// Errors returned by lifecycle operations.
#[derive(Debug, Error)]
pub enum FleetError {
    /// The id is not a managed backend. No network call was made.
    #[error("backend '{0}' is not managed")]
    NotManaged(String),

    /// The control plane could not be reached.
    #[error(transparent)]
    RemoteCall(#[from] ControlError),
}

/// Result type for lifecycle operations.
pub type FleetResult<T> = Result<T, FleetError>;
