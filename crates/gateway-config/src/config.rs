//! Configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::error::ConfigError;

/// Environment variable holding the agent platform project endpoint
pub const ENDPOINT_VAR: &str = "AZURE_AI_PROJECT_ENDPOINT";
/// Environment variable holding the agent identifier
pub const AGENT_ID_VAR: &str = "AZURE_AI_AGENT_ID";

/// Log formats accepted by the `logging.format` setting
pub const LOG_FORMATS: &[&str] = &["pretty", "json", "compact"];

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP server settings
    pub server: ServerSettings,
    /// Agent platform settings
    pub platform: PlatformConfig,
    /// Logging settings
    pub logging: LoggingSettings,
    /// File the configuration was read from, if any
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl GatewayConfig {
    /// Log where the configuration came from and what it resolved to.
    ///
    /// Called once logging is installed, since loading precedes it.
    pub fn log_summary(&self) {
        match &self.source {
            Some(path) => info!(path = %path.display(), "Loaded configuration file"),
            None => info!("No configuration file, using defaults and environment"),
        }
        debug!(
            host = %self.server.host,
            port = self.server.port,
            endpoint_set = self.platform.endpoint.is_some(),
            agent_id_set = self.platform.agent_id.is_some(),
            run_timeout = ?self.platform.run_timeout,
            "Configuration resolved"
        );
    }

    /// Check values that would prevent the server from starting.
    ///
    /// Platform endpoint and agent id are checked separately by
    /// [`PlatformConfig::target`], since their absence only disables the agent.
    ///
    /// # Errors
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::invalid("server.host", "must not be empty"));
        }
        if self.server.port == 0 {
            return Err(ConfigError::invalid("server.port", "must be between 1 and 65535"));
        }
        if self.platform.api_version.trim().is_empty() {
            return Err(ConfigError::invalid("platform.api_version", "must not be empty"));
        }
        if self.platform.poll_interval.is_zero() {
            return Err(ConfigError::invalid("platform.poll_interval", "must be greater than zero"));
        }
        if self.platform.run_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::invalid("platform.run_timeout", "must be greater than zero"));
        }
        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::invalid(
                "logging.format",
                format!(
                    "expected one of {}, got '{}'",
                    LOG_FORMATS.join(", "),
                    self.logging.format
                ),
            ));
        }
        Ok(())
    }
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Service name reported by the health endpoint
    pub service_name: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            service_name: "Invoice Agent API".to_string(),
        }
    }
}

/// Agent platform settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Project endpoint URL
    pub endpoint: Option<String>,
    /// Agent identifier
    pub agent_id: Option<String>,
    /// REST API version sent as `api-version`
    pub api_version: String,
    /// Interval between run status polls
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Upper bound on waiting for a run; unbounded when unset
    #[serde(with = "humantime_serde")]
    pub run_timeout: Option<Duration>,
    /// Timeout for each individual HTTP call to the platform
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            agent_id: None,
            api_version: "v1".to_string(),
            poll_interval: Duration::from_secs(1),
            run_timeout: None,
            request_timeout: Duration::from_secs(300),
        }
    }
}

/// Endpoint and agent the gateway is bound to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformTarget {
    /// Project endpoint
    pub endpoint: Url,
    /// Agent identifier
    pub agent_id: String,
}

impl PlatformConfig {
    /// Resolve the required endpoint and agent id.
    ///
    /// # Errors
    /// Returns [`ConfigError::Missing`] when either value is absent and
    /// [`ConfigError::Invalid`] when the endpoint is not an http(s) URL.
    pub fn target(&self) -> Result<PlatformTarget, ConfigError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::missing(ENDPOINT_VAR))?;
        let agent_id = self
            .agent_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::missing(AGENT_ID_VAR))?;

        let endpoint = Url::parse(endpoint)
            .map_err(|e| ConfigError::invalid(ENDPOINT_VAR, e.to_string()))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ConfigError::invalid(
                ENDPOINT_VAR,
                format!("unsupported scheme '{}'", endpoint.scheme()),
            ));
        }

        Ok(PlatformTarget {
            endpoint,
            agent_id: agent_id.to_string(),
        })
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive (e.g. `info`, `gateway_server=debug`)
    pub level: String,
    /// Output format: pretty, json or compact
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn platform(endpoint: Option<&str>, agent_id: Option<&str>) -> PlatformConfig {
        PlatformConfig {
            endpoint: endpoint.map(String::from),
            agent_id: agent_id.map(String::from),
            ..PlatformConfig::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.platform.api_version, "v1");
        assert_eq!(config.platform.poll_interval, Duration::from_secs(1));
        assert!(config.platform.run_timeout.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_target_requires_endpoint_and_agent() {
        let err = platform(None, Some("asst_1")).target().unwrap_err();
        assert!(matches!(err, ConfigError::Missing { ref variable } if variable == ENDPOINT_VAR));

        let err = platform(Some("https://x.services.ai.azure.com"), Some("  "))
            .target()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing { ref variable } if variable == AGENT_ID_VAR));
    }

    #[test]
    fn test_target_rejects_bad_endpoint() {
        let err = platform(Some("not a url"), Some("asst_1")).target().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err = platform(Some("ftp://example.com"), Some("asst_1")).target().unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn test_target_resolves() {
        let target = platform(
            Some("https://acct.services.ai.azure.com/api/projects/invoices"),
            Some("asst_1"),
        )
        .target()
        .unwrap();
        assert_eq!(target.agent_id, "asst_1");
        assert_eq!(target.endpoint.host_str(), Some("acct.services.ai.azure.com"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = GatewayConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = GatewayConfig::default();
        config.logging.format = "xml".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("logging.format"));

        let mut config = GatewayConfig::default();
        config.platform.poll_interval = Duration::ZERO;
        assert!(config.validate().is_err());
    }
}
