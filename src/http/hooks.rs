//! Router hook endpoints.
//!
//! The router calls these on connect attempts, session changes and observed
//! online transitions.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::gate::{ConnectAttempt, ConnectOutcome, GateDecision};
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::http::websocket::directives_handler;
use crate::router::ClientId;

pub fn setup_router_hooks(state: AppState) -> Router {
    Router::new()
        .route("/router/connect", post(connect_attempt))
        .route("/router/request", post(connect_request))
        .route("/router/sessions", post(session_attached))
        .route("/router/sessions/{client}", delete(session_detached))
        .route("/router/backends/{id}/online", post(backend_online))
        .route("/router/directives", get(directives_handler))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    pub client: ClientId,
    pub target: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionUpdate {
    pub client: ClientId,
    pub backend: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OnlineAck {
    pub delivered: usize,
}

async fn connect_attempt(
    State(state): State<AppState>,
    Json(attempt): Json<ConnectAttempt>,
) -> Json<GateDecision> {
    Json(state.fleet.gate.on_connect(&attempt).await)
}

async fn connect_request(
    State(state): State<AppState>,
    Json(request): Json<ConnectRequest>,
) -> Json<ConnectOutcome> {
    Json(state.fleet.gate.request_connect(&request.client, &request.target).await)
}

/// A client landed on a backend. Counts as activity for that backend.
async fn session_attached(
    State(state): State<AppState>,
    Json(update): Json<SessionUpdate>,
) -> StatusCode {
    let fleet = &state.fleet;
    fleet.sessions.attach(update.client, &update.backend);
    if fleet.coordinator.is_managed(&update.backend) {
        fleet.coordinator.activity().record_activity(&update.backend);
    }
    StatusCode::NO_CONTENT
}

async fn session_detached(
    State(state): State<AppState>,
    Path(client): Path<String>,
) -> Result<StatusCode, ApiError> {
    let client = ClientId::new(client);
    match state.fleet.sessions.detach(&client) {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(ApiError::NotFound(format!("No session for {client}"))),
    }
}

/// The router saw a backend come online; deliver anyone waiting for it.
async fn backend_online(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OnlineAck>, ApiError> {
    let coordinator = &state.fleet.coordinator;
    coordinator.descriptor(&id)?;
    let delivered = coordinator.deliver_pending(&id).await;
    Ok(Json(OnlineAck { delivered }))
}
