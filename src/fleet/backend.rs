//! Managed backend descriptors.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;

use crate::config::FleetConfig;

/// A lifecycle-managed backend. Immutable after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendDescriptor {
    /// Router server name.
    pub id: String,
    /// Control plane instance id.
    pub remote_id: String,
    /// Zero-player duration after which the backend may be stopped.
    pub idle_timeout: Duration,
    /// Address probed for liveness, when known.
    pub address: Option<SocketAddr>,
}

impl BackendDescriptor {
    pub fn new(id: impl Into<String>, remote_id: impl Into<String>, idle_timeout: Duration) -> Self {
        Self {
            id: id.into(),
            remote_id: remote_id.into(),
            idle_timeout,
            address: None,
        }
    }
}

/// The set of managed backends, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct BackendSet {
    backends: BTreeMap<String, BackendDescriptor>,
}

impl BackendSet {
    pub fn new(descriptors: impl IntoIterator<Item = BackendDescriptor>) -> Self {
        Self {
            backends: descriptors.into_iter().map(|d| (d.id.clone(), d)).collect(),
        }
    }

    /// Managed backends are the configured ones that carry a `remote_id`.
    pub fn from_config(config: &FleetConfig) -> Self {
        let default_timeout = config.idle.default_timeout_secs;
        Self::new(config.backends.iter().filter_map(|b| {
            Some(BackendDescriptor {
                id: b.id.clone(),
                remote_id: b.remote_id.clone()?,
                idle_timeout: Duration::from_secs(b.idle_timeout_secs.unwrap_or(default_timeout)),
                address: b.address.as_deref().and_then(|a| a.parse().ok()),
            })
        }))
    }

    pub fn get(&self, id: &str) -> Option<&BackendDescriptor> {
        self.backends.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.backends.contains_key(id)
    }

    /// Managed ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.backends.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BackendDescriptor> {
        self.backends.values()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}
