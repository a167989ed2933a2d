//! lazy-fleet daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!                 │                     LAZY-FLEET                       │
//!   Router        │  ┌──────────┐    ┌────────────────┐                  │
//!   ─connect────▶ │  │  router  │───▶│ ConnectionGate │──┐               │
//!   ─sessions───▶ │  │  hooks   │    └────────────────┘  │               │
//!   ◀─directives─ │  └──────────┘                        ▼               │
//!                 │                 ┌──────────────────────────┐  start/ │   Control
//!                 │  ┌──────────┐   │  LifecycleCoordinator    │──stop──▶│──▶ API
//!   Operator      │  │  admin   │──▶│  pending queue, probes   │         │
//!   ─fleet-cli──▶ │  │   API    │   └──────────────────────────┘         │
//!                 │  └──────────┘                ▲                       │
//!                 │                 ┌────────────┴───┐   ┌─────────────┐ │
//!                 │                 │  IdleMonitor   │◀──│  Scheduler  │ │
//!                 │                 └────────────────┘   └─────────────┘ │
//!                 │        ModeRegistry (modes.json)                     │
//!                 └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use lazy_fleet::config::load_config;
use lazy_fleet::lifecycle::{signals, Fleet, Shutdown, TokioScheduler};
use lazy_fleet::observability::{init_logging, init_metrics};
use lazy_fleet::HttpServer;

#[derive(Parser)]
#[command(name = "lazy-fleet")]
#[command(about = "Starts game servers on demand and stops them when idle", long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "fleet.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Config errors are fatal; logging is not up yet, so they go to stderr via `?`.
    let config = load_config(&args.config)?;
    init_logging(&config.observability.log_level);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "lazy-fleet starting");
    tracing::info!(
        config = %args.config.display(),
        backends = config.backends.len(),
        admin_address = %config.admin.bind_address,
        idle_check_secs = config.idle.check_interval_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.admin.bind_address).await?;
    let fleet = Arc::new(Fleet::build(config)?);

    let shutdown = Arc::new(Shutdown::new());
    signals::spawn_signal_handler(shutdown.clone());

    let tasks = fleet.start_background(&TokioScheduler);
    let server = HttpServer::new(fleet.clone(), &shutdown);
    let result = server.run(listener).await;

    for task in &tasks {
        task.cancel();
    }

    result?;
    tracing::info!("Shutdown complete");
    Ok(())
}
