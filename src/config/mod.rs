//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) or built-in defaults
//!     → loader.rs (parse & deserialize)
//!     → CLI overrides (main.rs)
//!     → validation.rs (semantic checks)
//!     → GroupConfig (validated, immutable)
//!     → lifecycle::startup builds listeners from it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the listener set is fixed at startup
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{GroupConfig, ListenerConfig, LogFormat, ObservabilityConfig, ShutdownConfig};
pub use validation::{validate_config, ValidationError};
