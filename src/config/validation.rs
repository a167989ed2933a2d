//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (fallback references an existing backend)
//! - Validate value ranges (intervals > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: FleetConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::schema::FleetConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    DuplicateBackend(String),
    EmptyBackendId,
    EmptyRemoteId(String),
    InvalidAddress { backend: String, address: String },
    UnknownFallback(String),
    InvalidBaseUrl(String),
    ZeroInterval(&'static str),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::DuplicateBackend(id) => write!(f, "duplicate backend id '{}'", id),
            ValidationError::EmptyBackendId => write!(f, "backend id must not be empty"),
            ValidationError::EmptyRemoteId(id) => write!(f, "backend '{}' has an empty remote_id", id),
            ValidationError::InvalidAddress { backend, address } => {
                write!(f, "backend '{}' has invalid address '{}'", backend, address)
            }
            ValidationError::UnknownFallback(id) => {
                write!(f, "fallback backend '{}' is not defined in [[backends]]", id)
            }
            ValidationError::InvalidBaseUrl(url) => write!(f, "invalid control base_url '{}'", url),
            ValidationError::ZeroInterval(field) => write!(f, "{} must be greater than zero", field),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &FleetConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if url::Url::parse(&config.control.base_url).is_err() {
        errors.push(ValidationError::InvalidBaseUrl(config.control.base_url.clone()));
    }

    let intervals = [
        ("control.request_timeout_secs", config.control.request_timeout_secs),
        ("idle.check_interval_secs", config.idle.check_interval_secs),
        ("startup.poll_interval_secs", config.startup.poll_interval_secs),
        ("startup.max_wait_secs", config.startup.max_wait_secs),
        ("probe.timeout_secs", config.probe.timeout_secs),
    ];
    for (field, value) in intervals {
        if value == 0 {
            errors.push(ValidationError::ZeroInterval(field));
        }
    }

    let mut seen = HashSet::new();
    for backend in &config.backends {
        if backend.id.trim().is_empty() {
            errors.push(ValidationError::EmptyBackendId);
            continue;
        }
        if !seen.insert(backend.id.as_str()) {
            errors.push(ValidationError::DuplicateBackend(backend.id.clone()));
        }
        if let Some(remote_id) = &backend.remote_id {
            if remote_id.trim().is_empty() {
                errors.push(ValidationError::EmptyRemoteId(backend.id.clone()));
            }
        }
        if let Some(address) = &backend.address {
            if address.parse::<SocketAddr>().is_err() {
                errors.push(ValidationError::InvalidAddress {
                    backend: backend.id.clone(),
                    address: address.clone(),
                });
            }
        }
    }

    if let Some(fallback) = &config.fallback.backend {
        if !seen.contains(fallback.as_str()) {
            errors.push(ValidationError::UnknownFallback(fallback.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
