//! CLI argument definitions using clap.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::time::Duration;

use crate::client::GatewayClient;
use crate::commands;
use crate::output::OutputFormat;

/// Invoice Agent - talk to a running Invoice Agent Gateway
#[derive(Parser, Debug)]
#[command(name = "invoice-agent")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Gateway base URL
    #[arg(
        short = 'u',
        long,
        env = "INVOICE_AGENT_URL",
        default_value = "http://localhost:8000",
        global = true
    )]
    pub url: String,

    /// Request timeout in seconds; agent runs can take a while
    #[arg(short = 't', long, default_value = "300", global = true)]
    pub timeout: u64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check gateway health and agent availability
    Health(commands::health::HealthArgs),

    /// Create a new conversation thread
    #[command(name = "new-thread")]
    NewThread,

    /// Send a message to the invoice agent
    Chat(commands::chat::ChatArgs),

    /// Show the messages of a thread
    Messages(commands::messages::MessagesArgs),

    /// Run health, new-thread, chat and messages in sequence
    Smoke(commands::smoke::SmokeArgs),
}

impl Cli {
    /// Execute the CLI command.
    pub async fn execute(self) -> Result<()> {
        let client = GatewayClient::new(&self.url, Duration::from_secs(self.timeout))?;
        let format = OutputFormat::from_json_flag(self.json);

        match self.command {
            Commands::Health(args) => commands::health::execute(args, &client, format).await,
            Commands::NewThread => commands::new_thread::execute(&client, format).await,
            Commands::Chat(args) => commands::chat::execute(args, &client, format).await,
            Commands::Messages(args) => commands::messages::execute(args, &client, format).await,
            Commands::Smoke(args) => commands::smoke::execute(args, &client, format).await,
        }
    }
}
