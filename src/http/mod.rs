//! HTTP surface.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, bearer auth)
//!     → /admin/*   → admin handlers → FleetCommands
//!     → /router/*  → hooks.rs → ConnectionGate / SessionRoster / LifecycleCoordinator
//!     → /router/directives → websocket.rs (RouterDirective stream)
//!     → response.rs (error mapping)
//! ```

pub mod hooks;
pub mod response;
pub mod server;
pub mod websocket;

pub use response::ApiError;
pub use server::{AppState, HttpServer};
