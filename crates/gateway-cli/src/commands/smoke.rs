//! Smoke test: health, new thread, chat, then messages.

use anyhow::{Context, Result};
use clap::Args;

use crate::client::GatewayClient;
use crate::commands::ensure_success;
use crate::output::{self, OutputFormat};

/// Arguments for the smoke command.
#[derive(Args, Debug)]
pub struct SmokeArgs {
    /// Message sent to the agent
    #[arg(short, long, default_value = "")]
    pub message: String,

    /// Let the chat call create the thread instead of calling new-thread
    #[arg(long)]
    pub auto_thread: bool,
}

/// Execute the smoke command.
pub async fn execute(args: SmokeArgs, client: &GatewayClient, format: OutputFormat) -> Result<()> {
    let text = format == OutputFormat::Text;

    if text {
        output::section("1. Health check");
    }
    let health = client.health().await?;
    if text {
        output::key_value("Status", &health.body.status);
        output::status("Agent available", health.body.agent_available);
    }

    let thread_id = if args.auto_thread {
        None
    } else {
        if text {
            output::section("2. New thread");
        }
        let reply = client.new_thread().await?;
        ensure_success(&reply, reply.body.success, reply.body.error.as_deref(), format)?;
        let id = reply.body.thread_id.context("Gateway returned no thread id")?;
        if text {
            output::key_value("Thread", &id);
        }
        Some(id)
    };

    if text {
        output::section("3. Chat");
    }
    let spinner = text.then(|| output::spinner("Waiting for the agent..."));
    let chat = client.chat(&args.message, thread_id.as_deref()).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let chat = chat?;
    ensure_success(&chat, chat.body.success, chat.body.error.as_deref(), format)?;
    let thread_id = chat
        .body
        .thread_id
        .clone()
        .context("Gateway returned no thread id")?;
    if text {
        let run_status = chat
            .body
            .run_status
            .map_or_else(|| "-".to_string(), |s| s.to_string());
        output::key_value("Run status", &run_status);
    }

    if text {
        output::section("4. Latest reply");
    }
    let messages = client.messages(&thread_id).await?;
    ensure_success(&messages, messages.body.success, messages.body.error.as_deref(), format)?;

    match format {
        OutputFormat::Json => output::json(&serde_json::json!({
            "health": health.body,
            "chat": chat.body,
            "messages": messages.body,
        }))?,
        OutputFormat::Text => {
            output::agent_reply(&messages.body.messages);
            output::success("Smoke test passed");
        }
    }
    Ok(())
}
