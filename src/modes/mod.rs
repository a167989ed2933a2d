//! Backend operating modes.
//!
//! # State Machine
//! ```text
//! STANDARD ⇄ SOFT_FORCE_ON ⇄ HARD_FORCE_ON ⇄ SOFT_FORCE_OFF ⇄ HARD_FORCE_OFF
//!   (any → any via explicit set)
//!
//! On load: SOFT_FORCE_ON / SOFT_FORCE_OFF → STANDARD
//! ```
//!
//! # Design Decisions
//! - A mode is a plain enum; its policy comes from a fixed lookup table
//! - `get` never fails: absent means STANDARD
//! - `set` persists synchronously; the file is always fully rewritten

pub mod mode;
pub mod registry;

pub use mode::{ModePolicy, OperatingMode, UnknownMode};
pub use registry::{ModeRegistry, PersistenceError};
