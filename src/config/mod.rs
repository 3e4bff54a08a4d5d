//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GuardConfig (validated, immutable)
//!     → BreakerRegistry::from_config builds one breaker per entry
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; breakers never see a changed threshold
//! - Every section is `#[serde(default)]`, so a file naming one breaker is enough
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{AdminConfig, BreakerConfig, GuardConfig, LogFormat, ObservabilityConfig};
pub use validation::{validate_breaker, validate_config, ValidationError};
