//! # Gateway Config
//!
//! Configuration management for the Invoice Agent Gateway.
//!
//! Settings come from built-in defaults, an optional YAML/TOML/JSON file and
//! environment variables. The agent platform endpoint and agent id are
//! optional at load time; [`PlatformConfig::target`] reports their absence
//! so the server can start and report the agent as unavailable.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod loader;

pub use config::{
    GatewayConfig, LoggingSettings, PlatformConfig, PlatformTarget, ServerSettings, AGENT_ID_VAR,
    ENDPOINT_VAR, LOG_FORMATS,
};
pub use error::ConfigError;
pub use loader::{load_config, ConfigLoader, CONFIG_FILE_VAR};
