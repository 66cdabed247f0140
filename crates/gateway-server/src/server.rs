//! HTTP server lifecycle.

use gateway_config::ServerSettings;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::info;

use crate::{routes::create_router, shutdown::shutdown_signal, state::AppState};

/// Server bind settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,
    /// Bind port
    pub port: u16,
}

impl ServerConfig {
    /// Create a bind configuration
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Socket address string
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl From<&ServerSettings> for ServerConfig {
    fn from(settings: &ServerSettings) -> Self {
        Self::new(settings.host.clone(), settings.port)
    }
}

/// Server failure
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not bind
    #[error("Failed to bind {address}: {source}")]
    Bind {
        /// Requested address
        address: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
    /// The server stopped with an I/O error
    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// The gateway HTTP server
pub struct Server {
    config: ServerConfig,
    state: AppState,
}

impl Server {
    /// Create a server
    #[must_use]
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Serve until SIGINT or SIGTERM, then drain in-flight requests.
    ///
    /// # Errors
    /// Returns an error if binding fails or the server stops abnormally.
    pub async fn run(self) -> Result<(), ServerError> {
        let address = self.config.address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| ServerError::Bind {
                address: address.clone(),
                source,
            })?;

        info!(
            address = %address,
            service = %self.state.service_name,
            agent_available = self.state.agent_available(),
            "Server listening"
        );

        axum::serve(listener, create_router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped");
        Ok(())
    }
}
