//! Thread messages command.

use anyhow::Result;
use clap::Args;

use gateway_core::ConversationMessage;

use crate::client::GatewayClient;
use crate::commands::ensure_success;
use crate::output::{self, OutputFormat};

/// Arguments for the messages command.
#[derive(Args, Debug)]
pub struct MessagesArgs {
    /// Thread identifier
    pub thread_id: String,

    /// Show only the last N messages
    #[arg(long, value_name = "N")]
    pub last: Option<usize>,
}

/// Drop all but the last `n` messages.
fn keep_last(messages: &mut Vec<ConversationMessage>, n: Option<usize>) {
    if let Some(n) = n {
        let skip = messages.len().saturating_sub(n);
        messages.drain(..skip);
    }
}

/// Execute the messages command.
pub async fn execute(
    args: MessagesArgs,
    client: &GatewayClient,
    format: OutputFormat,
) -> Result<()> {
    let mut reply = client.messages(&args.thread_id).await?;
    ensure_success(&reply, reply.body.success, reply.body.error.as_deref(), format)?;

    keep_last(&mut reply.body.messages, args.last);

    match format {
        OutputFormat::Json => output::json(&reply.body)?,
        OutputFormat::Text => {
            output::section(&format!("Thread {}", args.thread_id));
            output::conversation(&reply.body.messages);
        }
    }
    Ok(())
}
