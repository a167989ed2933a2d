//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router for the admin API and router hooks
//! - Wire up middleware (request ID, tracing, auth, admin timeout)
//! - Serve on a listener until shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, Router};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::{self, auth::require_api_key};
use crate::http::hooks;
use crate::lifecycle::{Fleet, Shutdown, ShutdownSignal};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub fleet: Arc<Fleet>,
    /// Lets long-lived streams end with the server.
    pub shutdown: ShutdownSignal,
}

/// HTTP server for the admin API and router hooks.
pub struct HttpServer {
    router: Router,
    shutdown: ShutdownSignal,
}

impl HttpServer {
    pub fn new(fleet: Arc<Fleet>, shutdown: &Shutdown) -> Self {
        let state = AppState {
            fleet,
            shutdown: shutdown.subscribe(),
        };
        Self {
            router: Self::build_router(state),
            shutdown: shutdown.subscribe(),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState) -> Router {
        let admin_timeout = Duration::from_secs(state.fleet.config.admin.request_timeout_secs);

        let admin = admin::setup_admin_router(state.clone()).layer(TimeoutLayer::new(admin_timeout));
        let hooks = hooks::setup_router_hooks(state.clone());

        Router::new()
            .merge(admin)
            .merge(hooks)
            .layer(middleware::from_fn_with_state(state, require_api_key))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// The assembled router, for embedding or in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(self.shutdown.recv())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
