//! Error responses.
//!
//! # Design Decisions
//! - Bodies are short human-readable messages in `{"ok": false, "message": ...}`
//! - Internal error detail is logged by the caller, never returned

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::commands::CommandReply;
use crate::fleet::FleetError;
use crate::modes::UnknownMode;

/// Errors surfaced by HTTP handlers.
#[derive(Debug)]
pub enum ApiError {
    NotManaged(String),
    BadRequest(String),
    NotFound(String),
    Upstream(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotManaged(_) | ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::NotManaged(id) => format!("Unknown managed server: {id}"),
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) | ApiError::Upstream(msg) => msg.clone(),
        }
    }
}

impl From<FleetError> for ApiError {
    fn from(err: FleetError) -> Self {
        match err {
            FleetError::NotManaged(id) => ApiError::NotManaged(id),
            FleetError::RemoteCall(_) => ApiError::Upstream("Control plane request failed".to_string()),
        }
    }
}

impl From<UnknownMode> for ApiError {
    fn from(err: UnknownMode) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(CommandReply::failed(self.message()))).into_response()
    }
}

/// Map a command reply to a response: `ok: false` uses `failure_status`.
pub fn reply_response(reply: CommandReply, failure_status: StatusCode) -> Response {
    let status = if reply.ok { StatusCode::OK } else { failure_status };
    (status, Json(reply)).into_response()
}
