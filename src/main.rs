//! # Invoice Agent Gateway
//!
//! HTTP gateway in front of a hosted Azure AI invoice-processing agent.
//!
//! ## Usage
//!
//! ```bash
//! AZURE_AI_PROJECT_ENDPOINT=https://acct.services.ai.azure.com/api/projects/invoices \
//! AZURE_AI_AGENT_ID=asst_abc123 \
//! invoice-agent-gateway
//!
//! # Optional config file (YAML, TOML or JSON)
//! GATEWAY_CONFIG=/etc/invoice-agent/gateway.yaml invoice-agent-gateway
//! ```
//!
//! If the agent platform cannot be reached at startup the server still comes
//! up, reports `agent_available: false` on `/` and answers 503 elsewhere.

use anyhow::Context;
use gateway_config::{load_config, GatewayConfig};
use gateway_core::InvoiceAgentService;
use gateway_providers::{AzureAgentsClient, AzureAgentsConfig};
use gateway_server::{AppState, Server, ServerConfig};
use gateway_telemetry::{init_logging, LogFormat, LoggingConfig};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Application entry point
#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Failed to read .env file: {e}");
        }
    }

    if let Err(e) = run().await {
        error!(error = format!("{e:#}"), "Application failed");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = load_config().await.context("Failed to load configuration")?;

    let format: LogFormat = config.logging.format.parse()?;
    init_logging(
        &LoggingConfig::new()
            .with_level(config.logging.level.clone())
            .with_format(format),
    )?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        service = %config.server.service_name,
        "Starting Invoice Agent Gateway"
    );
    config.log_summary();

    let agent = match connect_agent(&config).await {
        Ok(service) => Some(Arc::new(service)),
        Err(e) => {
            error!(error = format!("{e:#}"), "Failed to initialize invoice service");
            warn!("Serving without an agent; agent endpoints will return 503");
            None
        }
    };

    let state = AppState::builder().config(&config).maybe_agent(agent).build();

    Server::new(ServerConfig::from(&config.server), state)
        .run()
        .await
        .context("Server failed")
}

async fn connect_agent(config: &GatewayConfig) -> anyhow::Result<InvoiceAgentService> {
    let target = config.platform.target()?;

    let client_config = AzureAgentsConfig::new(target.endpoint)
        .with_api_version(config.platform.api_version.clone())
        .with_poll_interval(config.platform.poll_interval)
        .with_run_timeout(config.platform.run_timeout)
        .with_request_timeout(config.platform.request_timeout);
    let client = AzureAgentsClient::from_env(client_config)?;

    let service = InvoiceAgentService::initialize(Arc::new(client), target.agent_id).await?;
    Ok(service)
}
