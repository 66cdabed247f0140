//! New thread command.

use anyhow::Result;

use crate::client::GatewayClient;
use crate::commands::ensure_success;
use crate::output::{self, OutputFormat};

/// Execute the new-thread command.
pub async fn execute(client: &GatewayClient, format: OutputFormat) -> Result<()> {
    let reply = client.new_thread().await?;
    ensure_success(&reply, reply.body.success, reply.body.error.as_deref(), format)?;

    match format {
        OutputFormat::Json => output::json(&reply.body)?,
        OutputFormat::Text => {
            output::success("Thread created");
            output::key_value("Thread", reply.body.thread_id.as_deref().unwrap_or("-"));
            output::key_value("Created", reply.body.created_at.as_deref().unwrap_or("-"));
        }
    }
    Ok(())
}
