//! CLI commands module.

pub mod chat;
pub mod health;
pub mod messages;
pub mod new_thread;
pub mod smoke;

use anyhow::Result;
use serde::Serialize;

use crate::client::Reply;
use crate::output::{self, OutputFormat};

/// Fail with the reply's error; in JSON mode the body is printed first.
pub(crate) fn ensure_success<T: Serialize>(
    reply: &Reply<T>,
    success: bool,
    error: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    if success {
        return Ok(());
    }
    if format == OutputFormat::Json {
        output::json(&reply.body)?;
    }
    anyhow::bail!("{} ({})", error.unwrap_or("Request failed"), reply.status)
}
