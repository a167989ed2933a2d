//! OS signal handling.
//!
//! # Responsibilities
//! - Wait for SIGINT (Ctrl+C) or SIGTERM
//! - Translate either into a [`Shutdown`] trigger
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - SIGTERM is only watched on unix targets

use std::sync::Arc;

use crate::lifecycle::Shutdown;

/// Resolve on the first termination signal.
pub async fn termination() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!(signal = "SIGINT", "Received termination signal"),
        _ = terminate => tracing::info!(signal = "SIGTERM", "Received termination signal"),
    }
}

/// Trigger `shutdown` when a termination signal arrives.
pub fn spawn_signal_handler(shutdown: Arc<Shutdown>) {
    tokio::spawn(async move {
        termination().await;
        shutdown.trigger();
    });
}
