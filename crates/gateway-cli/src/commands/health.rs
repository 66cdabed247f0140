//! Health check command.

use anyhow::Result;
use clap::Args;
use std::time::Instant;

use crate::client::GatewayClient;
use crate::output::{self, ErrorReport, OutputFormat};

/// Arguments for the health command.
#[derive(Args, Debug)]
pub struct HealthArgs {
    /// Fail unless the agent is available
    #[arg(long)]
    pub require_agent: bool,
}

/// Execute the health command.
pub async fn execute(
    args: HealthArgs,
    client: &GatewayClient,
    format: OutputFormat,
) -> Result<()> {
    let spinner = (format == OutputFormat::Text)
        .then(|| output::spinner(&format!("Checking {}...", client.base_url())));

    let start = Instant::now();
    let result = client.health().await;
    let elapsed = start.elapsed();

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let reply = match result {
        Ok(reply) => reply,
        Err(e) => {
            if format == OutputFormat::Json {
                output::json(&ErrorReport::new(format!("{e:#}")))?;
            }
            return Err(e);
        }
    };

    match format {
        OutputFormat::Json => output::json(&reply.body)?,
        OutputFormat::Text => {
            output::success(&format!("Gateway is {}", reply.body.status));
            if let Some(service) = &reply.body.service {
                output::key_value("Service", service);
            }
            if let Some(version) = &reply.body.version {
                output::key_value("Version", version);
            }
            output::key_value("Response Time", &format!("{}ms", elapsed.as_millis()));
            output::status("Agent available", reply.body.agent_available);
        }
    }

    if args.require_agent && !reply.body.agent_available {
        anyhow::bail!("Agent is not available");
    }
    Ok(())
}
