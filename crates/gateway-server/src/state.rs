//! Shared application state.

use gateway_config::GatewayConfig;
use gateway_core::InvoiceAgentService;
use std::sync::Arc;

/// State injected into every handler.
///
/// `agent` is `None` when platform initialization failed at startup; the
/// server still runs and agent-dependent routes answer 503.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Connected agent service
    pub agent: Option<Arc<InvoiceAgentService>>,
    /// Name reported by the health endpoint
    pub service_name: String,
}

impl AppState {
    /// Start building a state
    #[must_use]
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::default()
    }

    /// Whether an agent service is available
    #[must_use]
    pub fn agent_available(&self) -> bool {
        self.agent.is_some()
    }
}

/// Builder for [`AppState`]
#[derive(Default)]
pub struct AppStateBuilder {
    agent: Option<Arc<InvoiceAgentService>>,
    service_name: Option<String>,
}

impl AppStateBuilder {
    /// Take settings from the gateway configuration
    #[must_use]
    pub fn config(mut self, config: &GatewayConfig) -> Self {
        self.service_name = Some(config.server.service_name.clone());
        self
    }

    /// Set the service name
    #[must_use]
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Attach a connected agent service
    #[must_use]
    pub fn agent(mut self, agent: Arc<InvoiceAgentService>) -> Self {
        self.agent = Some(agent);
        self
    }

    /// Attach the result of platform initialization
    #[must_use]
    pub fn maybe_agent(mut self, agent: Option<Arc<InvoiceAgentService>>) -> Self {
        self.agent = agent;
        self
    }

    /// Build the state
    #[must_use]
    pub fn build(self) -> AppState {
        AppState {
            agent: self.agent,
            service_name: self
                .service_name
                .unwrap_or_else(|| GatewayConfig::default().server.service_name),
        }
    }
}
