//! Chat command - send a message to the invoice agent.

use anyhow::{Context, Result};
use clap::Args;
use std::io::{self, BufRead, Read, Write};

use crate::client::GatewayClient;
use crate::commands::ensure_success;
use crate::output::{self, OutputFormat};

/// Arguments for the chat command.
#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Message to send (if not provided, reads from stdin)
    pub message: Option<String>,

    /// Continue an existing thread
    #[arg(long)]
    pub thread: Option<String>,

    /// Interactive chat mode; keeps one thread for the session
    #[arg(short, long)]
    pub interactive: bool,

    /// Print the whole conversation instead of the latest reply
    #[arg(long)]
    pub full: bool,
}

/// Execute the chat command.
pub async fn execute(args: ChatArgs, client: &GatewayClient, format: OutputFormat) -> Result<()> {
    if args.interactive {
        return run_interactive(client, args.thread, format).await;
    }

    let message = match args.message {
        Some(message) => message,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read message from stdin")?;
            buffer.trim_end().to_string()
        }
    };

    send(client, &message, args.thread.as_deref(), args.full, format).await?;
    Ok(())
}

/// Send one message and print the outcome; returns the thread id.
async fn send(
    client: &GatewayClient,
    message: &str,
    thread_id: Option<&str>,
    full: bool,
    format: OutputFormat,
) -> Result<Option<String>> {
    let spinner =
        (format == OutputFormat::Text).then(|| output::spinner("Waiting for the agent..."));
    let result = client.chat(message, thread_id).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let reply = result?;
    let envelope = &reply.body;
    ensure_success(&reply, envelope.success, envelope.error.as_deref(), format)?;

    let conversation = envelope.conversation.as_deref().unwrap_or_default();
    match format {
        OutputFormat::Json => output::json(envelope)?,
        OutputFormat::Text if full => {
            output::key_value("Thread", envelope.thread_id.as_deref().unwrap_or("-"));
            output::conversation(conversation);
        }
        OutputFormat::Text => output::agent_reply(conversation),
    }

    Ok(envelope.thread_id.clone())
}

async fn run_interactive(
    client: &GatewayClient,
    mut thread_id: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    output::section("Invoice agent chat (empty line or Ctrl+D to exit)");

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            break;
        }

        match send(client, line, thread_id.as_deref(), false, format).await {
            Ok(Some(id)) => thread_id = Some(id),
            Ok(None) => {}
            Err(e) => output::warning(&format!("{e:#}")),
        }
    }

    if let Some(id) = thread_id {
        output::key_value("Thread", &id);
    }
    Ok(())
}
