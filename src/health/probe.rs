//! Liveness probing.
//!
//! # Responsibilities
//! - Answer "is this backend accepting connections right now?"
//! - Report probe latency for diagnostics

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time::{self, Instant};

use crate::config::BackendConfig;
use crate::router::RouterError;

/// Successful probe result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingResult {
    pub latency: Duration,
}

/// Router-side liveness probe.
///
/// `Ok(None)` means the server answered but is not ready.
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    async fn probe(&self, backend_id: &str) -> Result<Option<PingResult>, RouterError>;
}

/// Probes backends by opening a TCP connection to their configured address.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    addresses: HashMap<String, SocketAddr>,
    connect_timeout: Duration,
}

impl TcpProbe {
    pub fn new(addresses: HashMap<String, SocketAddr>, connect_timeout: Duration) -> Self {
        Self { addresses, connect_timeout }
    }

    /// Build from backend configs; entries without a parseable address are skipped.
    pub fn from_config(backends: &[BackendConfig], connect_timeout: Duration) -> Self {
        let addresses = backends
            .iter()
            .filter_map(|b| {
                let addr = b.address.as_deref()?.parse().ok()?;
                Some((b.id.clone(), addr))
            })
            .collect();
        Self::new(addresses, connect_timeout)
    }
}

#[async_trait]
impl LivenessProbe for TcpProbe {
    async fn probe(&self, backend_id: &str) -> Result<Option<PingResult>, RouterError> {
        let addr = self
            .addresses
            .get(backend_id)
            .ok_or_else(|| RouterError::UnknownServer(backend_id.to_string()))?;

        let started = Instant::now();
        match time::timeout(self.connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(_stream)) => Ok(Some(PingResult { latency: started.elapsed() })),
            Ok(Err(e)) => Err(RouterError::Probe(e)),
            Err(_) => {
                tracing::debug!(backend = %backend_id, addr = %addr, "Probe timed out");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_probe_listening_backend() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((_socket, _)) = listener.accept().await {}
        });

        let probe = TcpProbe::new(
            HashMap::from([("survival".to_string(), addr)]),
            Duration::from_secs(1),
        );
        assert!(probe.probe("survival").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_probe_closed_port_fails() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let probe = TcpProbe::new(
            HashMap::from([("survival".to_string(), addr)]),
            Duration::from_secs(1),
        );
        assert!(probe.probe("survival").await.is_err());
    }

    #[tokio::test]
    async fn test_probe_unknown_server() {
        let probe = TcpProbe::from_config(&[], Duration::from_secs(1));
        assert!(matches!(
            probe.probe("creative").await,
            Err(RouterError::UnknownServer(_))
        ));
    }
}
