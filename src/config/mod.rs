//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared by value/Arc with the server at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Locales are code, not config

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::GatewayConfig;
pub use schema::{
    ListenerConfig, LogFormat, ObservabilityConfig, RateLimitConfig, RateLimitRule, RoutingConfig,
    SecurityConfig, TimeoutConfig, UpstreamConfig,
};
pub use validation::{validate_config, ValidationError};
