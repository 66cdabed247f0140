//! Configuration loading.
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults
//! 2. Optional file named by `GATEWAY_CONFIG` (YAML, TOML or JSON)
//! 3. Environment variables

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::{GatewayConfig, AGENT_ID_VAR, ENDPOINT_VAR};
use crate::error::ConfigError;

/// Environment variable naming the optional config file
pub const CONFIG_FILE_VAR: &str = "GATEWAY_CONFIG";

/// Load configuration from the process environment.
///
/// # Errors
/// Returns an error if the config file cannot be read or parsed, or a value
/// is invalid.
pub async fn load_config() -> Result<GatewayConfig, ConfigError> {
    ConfigLoader::from_env().load().await
}

/// Builds a [`GatewayConfig`] from a file and a set of environment variables
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    env: HashMap<String, String>,
}

impl ConfigLoader {
    /// Create a loader with no file and no environment
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader reading the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::new().with_vars(std::env::vars())
    }

    /// Add environment variables; empty values are ignored
    #[must_use]
    pub fn with_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in vars {
            let value = value.into();
            if !value.trim().is_empty() {
                self.env.insert(key.into(), value);
            }
        }
        self
    }

    /// Use an explicit config file instead of `GATEWAY_CONFIG`
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Load and validate the configuration.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or a value is
    /// invalid.
    pub async fn load(&self) -> Result<GatewayConfig, ConfigError> {
        let file = self
            .file
            .clone()
            .or_else(|| self.env.get(CONFIG_FILE_VAR).map(PathBuf::from));

        let mut config = match file {
            Some(path) => {
                let mut config = read_file(&path).await?;
                config.source = Some(path);
                config
            }
            None => GatewayConfig::default(),
        };

        self.apply_env(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    fn var(&self, key: &str) -> Option<String> {
        self.env.get(key).map(|v| v.trim().to_string())
    }

    fn apply_env(&self, config: &mut GatewayConfig) -> Result<(), ConfigError> {
        if let Some(host) = self.var("HOST") {
            config.server.host = host;
        }
        if let Some(port) = self.var("PORT") {
            config.server.port = port.parse().map_err(|_| {
                ConfigError::invalid("PORT", format!("'{port}' is not a valid port"))
            })?;
        }
        if let Some(name) = self.var("SERVICE_NAME") {
            config.server.service_name = name;
        }

        if let Some(endpoint) = self.var(ENDPOINT_VAR) {
            config.platform.endpoint = Some(endpoint);
        }
        if let Some(agent_id) = self.var(AGENT_ID_VAR) {
            config.platform.agent_id = Some(agent_id);
        }
        if let Some(version) = self.var("AZURE_AI_API_VERSION") {
            config.platform.api_version = version;
        }
        if let Some(interval) = self.duration_var("AZURE_AI_POLL_INTERVAL")? {
            config.platform.poll_interval = interval;
        }
        if let Some(timeout) = self.duration_var("AZURE_AI_RUN_TIMEOUT")? {
            config.platform.run_timeout = Some(timeout);
        }
        if let Some(timeout) = self.duration_var("AZURE_AI_REQUEST_TIMEOUT")? {
            config.platform.request_timeout = timeout;
        }

        if let Some(level) = self.var("LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(format) = self.var("LOG_FORMAT") {
            config.logging.format = format.to_lowercase();
        }

        Ok(())
    }

    fn duration_var(&self, key: &str) -> Result<Option<Duration>, ConfigError> {
        self.var(key)
            .map(|raw| {
                humantime_serde::re::humantime::parse_duration(&raw)
                    .map_err(|e| ConfigError::invalid(key, format!("'{raw}': {e}")))
            })
            .transpose()
    }
}

async fn read_file(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let parse_err = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };

    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => {
            serde_yaml::from_str(&contents).map_err(|e| parse_err(e.to_string()))
        }
        Some("toml") => toml::from_str(&contents).map_err(|e| parse_err(e.to_string())),
        Some("json") => serde_json::from_str(&contents).map_err(|e| parse_err(e.to_string())),
        other => Err(parse_err(format!(
            "unsupported extension '{}', expected yaml, toml or json",
            other.unwrap_or("")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn temp_file(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_env_overrides() {
        let config = ConfigLoader::new()
            .with_vars([
                ("PORT", "9000"),
                (ENDPOINT_VAR, "https://acct.services.ai.azure.com/api/projects/p"),
                (AGENT_ID_VAR, "asst_1"),
                ("AZURE_AI_RUN_TIMEOUT", "2m"),
                ("LOG_FORMAT", "JSON"),
            ])
            .load()
            .await
            .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.platform.agent_id.as_deref(), Some("asst_1"));
        assert_eq!(config.platform.run_timeout, Some(Duration::from_secs(120)));
        assert_eq!(config.logging.format, "json");
        assert!(config.platform.target().is_ok());
    }

    #[tokio::test]
    async fn test_empty_env_values_are_ignored() {
        let config = ConfigLoader::new()
            .with_vars([(AGENT_ID_VAR, ""), ("PORT", "  ")])
            .load()
            .await
            .unwrap();
        assert_eq!(config.platform.agent_id, None);
        assert_eq!(config.server.port, 8000);
    }

    #[tokio::test]
    async fn test_missing_platform_settings_do_not_fail_loading() {
        let config = ConfigLoader::new().load().await.unwrap();
        assert_eq!(config.source, None);
        assert!(matches!(
            config.platform.target(),
            Err(ConfigError::Missing { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_port() {
        let err = ConfigLoader::new()
            .with_vars([("PORT", "eighty")])
            .load()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[tokio::test]
    async fn test_invalid_duration() {
        let err = ConfigLoader::new()
            .with_vars([("AZURE_AI_POLL_INTERVAL", "soon")])
            .load()
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[tokio::test]
    async fn test_yaml_file_with_env_precedence() {
        let file = temp_file(
            ".yaml",
            r"
server:
  port: 8081
  service_name: Invoice Agent API (staging)
platform:
  endpoint: https://file.services.ai.azure.com/api/projects/p
  agent_id: asst_file
  poll_interval: 500ms
logging:
  format: compact
",
        );

        let config = ConfigLoader::new()
            .with_file(file.path())
            .with_vars([(AGENT_ID_VAR, "asst_env")])
            .load()
            .await
            .unwrap();

        assert_eq!(config.server.port, 8081);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.service_name, "Invoice Agent API (staging)");
        assert_eq!(config.platform.agent_id.as_deref(), Some("asst_env"));
        assert_eq!(config.platform.poll_interval, Duration::from_millis(500));
        assert_eq!(config.logging.format, "compact");
        assert_eq!(config.source.as_deref(), Some(file.path()));
    }

    #[tokio::test]
    async fn test_toml_file_from_env_var() {
        let file = temp_file(
            ".toml",
            r#"
[platform]
endpoint = "https://toml.services.ai.azure.com/api/projects/p"
run_timeout = "45s"
"#,
        );

        let path = file.path().to_string_lossy().to_string();
        let config = ConfigLoader::new()
            .with_vars([(CONFIG_FILE_VAR, path)])
            .load()
            .await
            .unwrap();

        assert_eq!(config.platform.run_timeout, Some(Duration::from_secs(45)));
        assert_eq!(config.platform.api_version, "v1");
    }

    #[tokio::test]
    async fn test_unsupported_extension() {
        let file = temp_file(".ini", "port=1");
        let err = ConfigLoader::new().with_file(file.path()).load().await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = ConfigLoader::new()
            .with_file("/nonexistent/gateway.yaml")
            .load()
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
