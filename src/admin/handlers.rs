use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Json,
};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};

use crate::http::response::{reply_response, ApiError};
use crate::http::server::AppState;
use crate::modes::OperatingMode;

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemStatus {
    pub version: String,
    pub status: String,
    pub managed_backends: usize,
    pub routers_connected: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BackendStatus {
    pub id: String,
    pub remote_id: String,
    pub mode: OperatingMode,
    pub online: bool,
    pub players: usize,
    pub pending: usize,
    pub idle_secs: u64,
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModeView {
    pub id: String,
    pub mode: OperatingMode,
}

#[derive(Debug, Deserialize)]
pub struct ModeChange {
    pub mode: String,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "operational".to_string(),
        managed_backends: state.fleet.coordinator.backends().len(),
        routers_connected: state.fleet.sessions.router_count(),
    })
}

/// Every managed backend with live online status, probed concurrently.
pub async fn get_backends(State(state): State<AppState>) -> Json<Vec<BackendStatus>> {
    let fleet = &state.fleet;
    let coordinator = &fleet.coordinator;

    let rows = coordinator.backends().iter().map(|backend| async move {
        let id = backend.id.as_str();
        BackendStatus {
            id: backend.id.clone(),
            remote_id: backend.remote_id.clone(),
            mode: fleet.modes.get(id),
            online: coordinator.is_online(id).await,
            players: coordinator.player_count(id).await,
            pending: coordinator.pending_count(id),
            idle_secs: coordinator.activity().idle_for(id).as_secs(),
            idle_timeout_secs: backend.idle_timeout.as_secs(),
        }
    });

    Json(join_all(rows).await)
}

pub async fn get_mode(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ModeView>, ApiError> {
    let mode = state.fleet.commands.mode(&id)?;
    Ok(Json(ModeView { id, mode }))
}

pub async fn put_mode(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(change): Json<ModeChange>,
) -> Result<Response, ApiError> {
    let mode: OperatingMode = change.mode.parse()?;
    let reply = state.fleet.commands.set_mode(&id, mode).await?;
    Ok(reply_response(reply, StatusCode::INTERNAL_SERVER_ERROR))
}

pub async fn post_start(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let reply = state.fleet.commands.start(&id).await?;
    Ok(reply_response(reply, StatusCode::BAD_GATEWAY))
}

pub async fn post_stop(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let reply = state.fleet.commands.stop(&id).await?;
    Ok(reply_response(reply, StatusCode::BAD_GATEWAY))
}
