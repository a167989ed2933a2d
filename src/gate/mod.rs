//! Connection gating.
//!
//! # Data Flow
//! ```text
//! POST /router/connect {client, target, current}
//!     → ConnectionGate::on_connect
//!         unmanaged                  → allow
//!         record activity
//!         hard-forced off            → deny(disabled), redirect to lobby
//!         online                     → allow
//!         auto-start forbidden       → deny(disabled), redirect to lobby
//!         otherwise                  → queue client, start, watch,
//!                                      deny(starting), redirect to lobby
//!
//! POST /router/request {client, target}
//!     → ConnectionGate::request_connect (start, wait, transfer)
//! ```
//!
//! # Design Decisions
//! - The gate never waits for a start; queued clients are delivered by the
//!   coordinator's online event
//! - No redirect is issued to a lobby the client is already on

pub mod connection;
pub mod decision;

pub use connection::ConnectionGate;
pub use decision::{ConnectAttempt, ConnectOutcome, DenyReason, GateDecision};
