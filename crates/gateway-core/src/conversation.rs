//! Conversation records returned to gateway callers.

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::platform::{RunStatus, ThreadMessage};

/// A single message as exposed by the HTTP API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// Author role, verbatim from the platform
    pub role: String,
    /// Last text segment of the message
    pub content: String,
    /// RFC 3339 creation time; `null` when the platform supplied none
    pub timestamp: Option<String>,
}

impl ConversationMessage {
    /// Map a platform message, skipping messages without any text segment
    pub fn from_thread_message(message: &ThreadMessage) -> Option<Self> {
        let content = message.last_text()?;
        Some(Self {
            role: message.role.clone(),
            content: content.to_string(),
            timestamp: message
                .created_at
                .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, false)),
        })
    }
}

/// Map a platform listing into the conversation, preserving its order
pub fn to_conversation(messages: &[ThreadMessage]) -> Vec<ConversationMessage> {
    messages
        .iter()
        .filter_map(ConversationMessage::from_thread_message)
        .collect()
}

/// Successful outcome of a chat exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    /// Thread the exchange ran on
    pub thread_id: String,
    /// Full thread conversation after the run
    pub conversation: Vec<ConversationMessage>,
    /// Terminal status of the run
    pub run_status: RunStatus,
}

/// Failed outcome of a chat exchange
#[derive(Debug, Clone)]
pub struct ChatFailure {
    /// Thread identifier, when one was known before the failure
    pub thread_id: Option<String>,
    /// Terminal run status, when the failure came from the run itself
    pub run_status: Option<RunStatus>,
    /// Caller-facing description
    pub error: String,
    /// Underlying platform error, if any
    pub source: Option<GatewayError>,
}

impl ChatFailure {
    /// Failure reported by the run's terminal status
    pub fn run_failed(thread_id: impl Into<String>, detail: &str) -> Self {
        Self {
            thread_id: Some(thread_id.into()),
            run_status: Some(RunStatus::Failed),
            error: format!("Agent run failed: {detail}"),
            source: None,
        }
    }

    /// Failure raised by a platform call
    pub fn platform(thread_id: Option<String>, error: GatewayError) -> Self {
        Self {
            thread_id,
            run_status: None,
            error: format!("Error processing message: {error}"),
            source: Some(error),
        }
    }
}

/// Uniform chat response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEnvelope {
    /// Primary discriminator for callers
    pub success: bool,
    /// Thread identifier, present whenever one is known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    /// Ordered conversation (success only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation: Option<Vec<ConversationMessage>>,
    /// Run status, when a run happened
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_status: Option<RunStatus>,
    /// Error text (failure only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<ChatReply> for ChatEnvelope {
    fn from(reply: ChatReply) -> Self {
        Self {
            success: true,
            thread_id: Some(reply.thread_id),
            conversation: Some(reply.conversation),
            run_status: Some(reply.run_status),
            error: None,
        }
    }
}

impl From<ChatFailure> for ChatEnvelope {
    fn from(failure: ChatFailure) -> Self {
        Self {
            success: false,
            thread_id: failure.thread_id,
            conversation: None,
            run_status: failure.run_status,
            error: Some(failure.error),
        }
    }
}
