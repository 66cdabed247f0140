//! Structured logging setup.
//!
//! Installs a `tracing-subscriber` registry with an env filter and one of
//! three output formats. `RUST_LOG` takes precedence over the configured
//! level when set.

use std::fmt;
use std::str::FromStr;
use tracing::info;
use tracing_subscriber::{
    fmt as fmt_layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line human-readable output
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
    /// Single-line human-readable output
    Compact,
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            other => Err(LoggingError::InvalidFormat(other.to_string())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
            Self::Compact => write!(f, "compact"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default filter directive
    pub level: String,
    /// Output format
    pub format: LogFormat,
    /// Include the event target (module path)
    pub with_target: bool,
    /// Include thread ids
    pub with_thread_ids: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            with_target: true,
            with_thread_ids: false,
        }
    }
}

impl LoggingConfig {
    /// Create a default logging configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default filter directive
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Set the output format
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Include thread ids in each event
    #[must_use]
    pub fn with_thread_ids(mut self, enabled: bool) -> Self {
        self.with_thread_ids = enabled;
        self
    }

    fn filter(&self) -> Result<EnvFilter, LoggingError> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.level)
                .map_err(|e| LoggingError::InvalidFilter(format!("{}: {e}", self.level))),
        }
    }
}

/// Install the global subscriber.
///
/// # Errors
/// Returns an error if the filter is invalid or a subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = config.filter()?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        LogFormat::Json => registry
            .with(
                fmt_layer::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(config.with_target)
                    .with_thread_ids(config.with_thread_ids),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                fmt_layer::layer()
                    .compact()
                    .with_target(config.with_target)
                    .with_thread_ids(config.with_thread_ids),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                fmt_layer::layer()
                    .with_target(config.with_target)
                    .with_thread_ids(config.with_thread_ids),
            )
            .try_init(),
    };
    result.map_err(|e| LoggingError::Init(e.to_string()))?;

    info!(level = %config.level, format = %config.format, "Logging initialized");
    Ok(())
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// Failed to install the subscriber
    #[error("Failed to initialize logging: {0}")]
    Init(String),
    /// Filter directive could not be parsed
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),
    /// Unknown output format
    #[error("Invalid log format '{0}', expected pretty, json or compact")]
    InvalidFormat(String),
}

/// Create a span for a call to the agent platform
#[macro_export]
macro_rules! platform_span {
    ($platform:expr, $operation:expr) => {
        tracing::info_span!(
            "platform_call",
            platform = %$platform,
            operation = %$operation,
        )
    };
    ($platform:expr, $operation:expr, $thread_id:expr) => {
        tracing::info_span!(
            "platform_call",
            platform = %$platform,
            operation = %$operation,
            thread_id = %$thread_id,
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = LoggingConfig::new()
            .with_level("debug")
            .with_format(LogFormat::Json)
            .with_thread_ids(true);

        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);
        assert!(config.with_thread_ids);
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("Compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.with_target);
    }

    #[test]
    fn test_platform_span_macro() {
        let span = crate::platform_span!("azure-ai-agents", "create_thread");
        let _entered = span.enter();
        let span = crate::platform_span!("azure-ai-agents", "list_messages", "thread_1");
        drop(span);
    }
}
