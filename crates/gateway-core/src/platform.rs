//! Agent platform abstraction.
//!
//! The gateway treats the hosted agent platform as an opaque capability set.
//! Implementations live in `gateway-providers`; tests use the in-memory
//! double from [`crate::testing`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::GatewayResult;

/// Capabilities the gateway consumes from a hosted agent platform.
#[async_trait]
pub trait AgentPlatform: Send + Sync {
    /// Short name of the platform, used in logs
    fn name(&self) -> &str;

    /// Fetch agent metadata
    async fn get_agent(&self, agent_id: &str) -> GatewayResult<AgentInfo>;

    /// Create a new conversation thread
    async fn create_thread(&self) -> GatewayResult<Thread>;

    /// Post a user-role message on a thread
    async fn post_message(&self, thread_id: &str, content: &str) -> GatewayResult<ThreadMessage>;

    /// Run the agent against a thread and wait for a terminal status
    async fn run_and_wait(&self, thread_id: &str, agent_id: &str) -> GatewayResult<Run>;

    /// List every message on a thread in ascending creation order
    async fn list_messages(&self, thread_id: &str) -> GatewayResult<Vec<ThreadMessage>>;
}

/// Agent metadata returned by the liveness check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentInfo {
    /// Agent identifier
    pub id: String,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Backing model deployment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl AgentInfo {
    /// Create agent metadata with only an identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            model: None,
        }
    }

    /// Set the display name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Name for logging, falling back to "Unknown"
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown")
    }
}

/// A conversation thread owned by the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thread {
    /// Opaque thread identifier
    pub id: String,
    /// Creation time reported by the platform
    pub created_at: Option<DateTime<Utc>>,
}

/// A message stored on a platform thread.
///
/// Only the text segments of the message content are kept, in the order the
/// platform returned them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadMessage {
    /// Message identifier
    pub id: String,
    /// Author role, verbatim from the platform
    pub role: String,
    /// Creation time reported by the platform
    pub created_at: Option<DateTime<Utc>>,
    /// Text segments of the message content
    pub text_segments: Vec<String>,
}

impl ThreadMessage {
    /// Last text segment, which carries the final rendering of the message
    pub fn last_text(&self) -> Option<&str> {
        self.text_segments.last().map(String::as_str)
    }
}

/// Run lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Waiting to start
    Queued,
    /// Executing
    InProgress,
    /// Waiting on tool outputs
    RequiresAction,
    /// Cancellation requested
    Cancelling,
    /// Cancelled
    Cancelled,
    /// Failed
    Failed,
    /// Completed successfully
    Completed,
    /// Expired before completing
    Expired,
    /// Ended without a full result
    Incomplete,
    /// Status this gateway does not recognise
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Whether the run has stopped and will not change again
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Cancelled | Self::Failed | Self::Completed | Self::Expired | Self::Incomplete
        )
    }

    /// Wire name of the status
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::RequiresAction => "requires_action",
            Self::Cancelling => "cancelling",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
            Self::Completed => "completed",
            Self::Expired => "expired",
            Self::Incomplete => "incomplete",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error detail attached to a failed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunError {
    /// Platform error code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Human-readable message
    #[serde(default)]
    pub message: String,
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{code}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// One invocation of the agent against a thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    /// Run identifier
    pub id: String,
    /// Current status
    pub status: RunStatus,
    /// Error detail when the run failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<RunError>,
}

impl Run {
    /// Description of the failure, or "None" when the platform gave no detail
    pub fn error_detail(&self) -> String {
        self.last_error
            .as_ref()
            .map_or_else(|| "None".to_string(), ToString::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_terminal() {
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert!(RunStatus::Expired.is_terminal());
        assert!(!RunStatus::Queued.is_terminal());
        assert!(!RunStatus::InProgress.is_terminal());
        assert!(!RunStatus::RequiresAction.is_terminal());
        assert!(!RunStatus::Unknown.is_terminal());
    }

    #[test]
    fn test_run_status_wire_format() {
        let status: RunStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(status, RunStatus::InProgress);
        assert_eq!(serde_json::to_string(&RunStatus::Completed).unwrap(), "\"completed\"");

        let status: RunStatus = serde_json::from_str("\"paused_for_lunch\"").unwrap();
        assert_eq!(status, RunStatus::Unknown);
    }

    #[test]
    fn test_run_error_detail() {
        let run = Run {
            id: "run_1".to_string(),
            status: RunStatus::Failed,
            last_error: Some(RunError {
                code: Some("rate_limit_exceeded".to_string()),
                message: "Rate limit is exceeded".to_string(),
            }),
        };
        assert_eq!(run.error_detail(), "rate_limit_exceeded: Rate limit is exceeded");

        let run = Run {
            last_error: None,
            ..run
        };
        assert_eq!(run.error_detail(), "None");
    }

    #[test]
    fn test_last_text() {
        let msg = ThreadMessage {
            id: "msg_1".to_string(),
            role: "assistant".to_string(),
            created_at: None,
            text_segments: vec!["draft".to_string(), "final".to_string()],
        };
        assert_eq!(msg.last_text(), Some("final"));

        let empty = ThreadMessage {
            text_segments: Vec::new(),
            ..msg
        };
        assert_eq!(empty.last_text(), None);
    }

    #[test]
    fn test_agent_display_name() {
        assert_eq!(AgentInfo::new("asst_1").display_name(), "Unknown");
        assert_eq!(
            AgentInfo::new("asst_1").with_name("Invoice Extractor").display_name(),
            "Invoice Extractor"
        );
    }
}
