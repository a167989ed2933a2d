//! Lazy lifecycle manager for on-demand game server backends.

pub mod admin;
pub mod commands;
pub mod config;
pub mod control;
pub mod fleet;
pub mod gate;
pub mod health;
pub mod http;
pub mod idle;
pub mod lifecycle;
pub mod modes;
pub mod observability;
pub mod router;

pub use config::FleetConfig;
pub use http::HttpServer;
pub use lifecycle::{Fleet, Shutdown};
