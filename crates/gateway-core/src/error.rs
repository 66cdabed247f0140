//! Error types for the gateway.

use std::time::Duration;
use thiserror::Error;

/// Result alias used throughout the gateway crates.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors raised while talking to the agent platform.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Missing or invalid configuration
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },

    /// Credential resolution or token acquisition failed
    #[error("Authentication error: {message}")]
    Authentication {
        /// Error message
        message: String,
    },

    /// A platform call failed or returned a non-success status
    #[error("{operation} failed{}: {message}", status_suffix(.status))]
    Platform {
        /// Platform operation that failed (e.g. `create_thread`)
        operation: String,
        /// Error message
        message: String,
        /// HTTP status returned by the platform, if any
        status: Option<u16>,
    },

    /// A run did not reach a terminal status within the configured bound
    #[error("Run {run_id} did not finish within {}s", .timeout.as_secs())]
    RunTimeout {
        /// Run identifier
        run_id: String,
        /// Configured bound
        timeout: Duration,
    },

    /// The platform returned a payload the gateway could not interpret
    #[error("Invalid platform response: {message}")]
    InvalidResponse {
        /// Error message
        message: String,
    },

    /// The gateway has no usable platform handle
    #[error("Service unavailable: {message}")]
    Unavailable {
        /// Error message
        message: String,
    },
}

impl GatewayError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create a platform error
    pub fn platform(
        operation: impl Into<String>,
        message: impl Into<String>,
        status: Option<u16>,
    ) -> Self {
        Self::Platform {
            operation: operation.into(),
            message: message.into(),
            status,
        }
    }

    /// Create an invalid response error
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Create an unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// HTTP status code this error maps to at the API boundary
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Unavailable { .. } => 503,
            _ => 500,
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}
