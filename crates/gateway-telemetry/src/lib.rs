//! # Gateway Telemetry
//!
//! Structured logging for the Invoice Agent Gateway.
//!
//! This crate provides:
//! - Subscriber installation with pretty, compact or JSON output
//! - A span macro for agent platform calls

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod logging;

// Re-export main types
pub use logging::{init_logging, LogFormat, LoggingConfig, LoggingError};
