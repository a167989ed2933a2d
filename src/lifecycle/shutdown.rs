//! Shutdown coordination for the daemon.

use tokio::sync::watch;

/// Coordinator for graceful shutdown.
///
/// Long-running tasks subscribe and finish when the signal fires. A task that
/// subscribes after the trigger sees it immediately.
#[derive(Debug)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal { rx: self.tx.subscribe() }
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Number of tasks still listening.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving half of [`Shutdown`].
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Resolve once shutdown is triggered or the coordinator is dropped.
    pub async fn recv(mut self) {
        let _ = self.rx.wait_for(|triggered| *triggered).await;
    }
}
