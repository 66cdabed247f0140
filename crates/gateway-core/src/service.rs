//! Invoice agent service.
//!
//! Owns the platform handle and the target agent identifier, and hides the
//! multi-step platform interactions behind one call per operation.

use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::conversation::{to_conversation, ChatFailure, ChatReply, ConversationMessage};
use crate::error::{GatewayError, GatewayResult};
use crate::platform::{AgentInfo, AgentPlatform, RunStatus, Thread};

/// Gateway service bound to a single hosted agent.
///
/// Immutable after [`InvoiceAgentService::initialize`]; share it behind an
/// `Arc` across request handlers.
pub struct InvoiceAgentService {
    platform: Arc<dyn AgentPlatform>,
    agent: AgentInfo,
}

impl std::fmt::Debug for InvoiceAgentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvoiceAgentService")
            .field("platform", &self.platform.name())
            .field("agent", &self.agent)
            .finish()
    }
}

impl InvoiceAgentService {
    /// Bind to an agent, fetching its metadata as a liveness check.
    ///
    /// # Errors
    /// Returns an error if the agent id is empty or the agent cannot be fetched.
    pub async fn initialize(
        platform: Arc<dyn AgentPlatform>,
        agent_id: impl Into<String>,
    ) -> GatewayResult<Self> {
        let agent_id = agent_id.into();
        if agent_id.trim().is_empty() {
            return Err(GatewayError::configuration("agent id must not be empty"));
        }

        let agent = platform.get_agent(&agent_id).await.map_err(|e| {
            error!(agent_id = %agent_id, error = %e, "Failed to reach agent");
            e
        })?;

        info!(
            agent_id = %agent.id,
            agent_name = %agent.display_name(),
            platform = %platform.name(),
            "Successfully connected to agent"
        );

        Ok(Self { platform, agent })
    }

    /// Identifier of the bound agent
    pub fn agent_id(&self) -> &str {
        &self.agent.id
    }

    /// Metadata fetched at initialization
    pub fn agent(&self) -> &AgentInfo {
        &self.agent
    }

    /// Send a user message and run the agent to completion.
    ///
    /// A missing or empty `thread_id` starts a new thread. Failures never
    /// escape as errors of another kind: every fault is described by the
    /// returned [`ChatFailure`], which carries the thread id once known.
    #[instrument(skip(self, user_text), fields(agent_id = %self.agent.id))]
    pub async fn send_message(
        &self,
        user_text: &str,
        thread_id: Option<&str>,
    ) -> Result<ChatReply, ChatFailure> {
        let thread_id = match thread_id.filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => {
                let thread = self
                    .platform
                    .create_thread()
                    .await
                    .map_err(|e| self.fail(None, e))?;
                info!(thread_id = %thread.id, "Created new thread");
                thread.id
            }
        };

        self.platform
            .post_message(&thread_id, user_text)
            .await
            .map_err(|e| self.fail(Some(&thread_id), e))?;

        let run = self
            .platform
            .run_and_wait(&thread_id, &self.agent.id)
            .await
            .map_err(|e| self.fail(Some(&thread_id), e))?;

        if run.status == RunStatus::Failed {
            let failure = ChatFailure::run_failed(&thread_id, &run.error_detail());
            error!(thread_id = %thread_id, run_id = %run.id, "{}", failure.error);
            return Err(failure);
        }

        debug!(thread_id = %thread_id, run_id = %run.id, status = %run.status, "Run finished");

        let conversation = self
            .list_messages(&thread_id)
            .await
            .map_err(|e| self.fail(Some(&thread_id), e))?;

        Ok(ChatReply {
            thread_id,
            conversation,
            run_status: run.status,
        })
    }

    /// Create a new conversation thread
    #[instrument(skip(self))]
    pub async fn create_thread(&self) -> GatewayResult<Thread> {
        let thread = self.platform.create_thread().await?;
        info!(thread_id = %thread.id, "Created new thread");
        Ok(thread)
    }

    /// List the thread's conversation in ascending creation order
    #[instrument(skip(self))]
    pub async fn list_messages(&self, thread_id: &str) -> GatewayResult<Vec<ConversationMessage>> {
        let messages = self.platform.list_messages(thread_id).await?;
        Ok(to_conversation(&messages))
    }

    fn fail(&self, thread_id: Option<&str>, error: GatewayError) -> ChatFailure {
        let failure = ChatFailure::platform(thread_id.map(str::to_string), error);
        warn!(thread_id = ?thread_id, error = %failure.error, "Chat exchange failed");
        failure
    }
}
