//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → FleetConfig (validated, immutable)
//!     → BackendSet / component settings built once at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; backend descriptors never change at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::FleetConfig;
pub use schema::{
    AdminConfig, BackendConfig, ControlConfig, FallbackConfig, IdleConfig, ModesConfig,
    ObservabilityConfig, ProbeConfig, StartupConfig,
};
