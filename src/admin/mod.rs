//! Operator API.
//!
//! Thin HTTP wrappers over `FleetCommands` plus read-only status views.

pub mod auth;
pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};

use self::handlers::*;
use crate::http::server::AppState;

pub fn setup_admin_router(state: AppState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/backends", get(get_backends))
        .route("/admin/backends/{id}/mode", get(get_mode).put(put_mode))
        .route("/admin/backends/{id}/start", post(post_start))
        .route("/admin/backends/{id}/stop", post(post_stop))
        .with_state(state)
}
