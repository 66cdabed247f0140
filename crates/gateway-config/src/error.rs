//! Configuration errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required setting was not provided
    #[error("Missing required setting: {variable}")]
    Missing {
        /// Environment variable (or file key) that must be set
        variable: String,
    },

    /// A setting has an unusable value
    #[error("Invalid value for {field}: {message}")]
    Invalid {
        /// Setting name
        field: String,
        /// What is wrong with it
        message: String,
    },

    /// The configuration file could not be read
    #[error("Failed to read config file {}: {source}", .path.display())]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The configuration file could not be parsed
    #[error("Failed to parse config file {}: {message}", .path.display())]
    Parse {
        /// File path
        path: PathBuf,
        /// Parser message
        message: String,
    },
}

impl ConfigError {
    /// Create a missing-setting error
    pub fn missing(variable: impl Into<String>) -> Self {
        Self::Missing {
            variable: variable.into(),
        }
    }

    /// Create an invalid-value error
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}
