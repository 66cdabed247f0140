//! In-memory agent platform for tests.
//!
//! Threads and messages live in a map; a completed run appends one assistant
//! message carrying the configured reply. Individual operations can be made
//! to fail to exercise error paths.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

use crate::error::{GatewayError, GatewayResult};
use crate::platform::{AgentInfo, AgentPlatform, Run, RunError, RunStatus, Thread, ThreadMessage};

/// Number of calls made to each platform operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    /// `get_agent` calls
    pub get_agent: usize,
    /// `create_thread` calls
    pub create_thread: usize,
    /// `post_message` calls
    pub post_message: usize,
    /// `run_and_wait` calls
    pub run_and_wait: usize,
    /// `list_messages` calls
    pub list_messages: usize,
}

impl CallCounts {
    /// Calls made after initialization (everything except `get_agent`)
    #[must_use]
    pub fn request_calls(&self) -> usize {
        self.create_thread + self.post_message + self.run_and_wait + self.list_messages
    }
}

#[derive(Default)]
struct MockState {
    threads: HashMap<String, Vec<ThreadMessage>>,
    next_id: usize,
    calls: CallCounts,
}

impl MockState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}_{}", self.next_id)
    }

    fn next_time(&self) -> DateTime<Utc> {
        base_time() + Duration::seconds(self.next_id as i64)
    }
}

fn base_time() -> DateTime<Utc> {
    Utc.timestamp_opt(1_714_550_400, 0)
        .single()
        .unwrap_or_default()
}

/// In-memory [`AgentPlatform`] test double
pub struct MockPlatform {
    agent: AgentInfo,
    reply: String,
    run_status: RunStatus,
    failing: HashSet<&'static str>,
    state: Mutex<MockState>,
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlatform {
    /// Agent id the mock recognises
    pub const AGENT_ID: &'static str = "asst_invoice";
    /// Error message attached to failed runs
    pub const RUN_ERROR_MESSAGE: &'static str = "The agent encountered an error";

    /// Create a mock whose runs complete with a canned reply
    #[must_use]
    pub fn new() -> Self {
        Self {
            agent: AgentInfo::new(Self::AGENT_ID).with_name("Invoice Data Extraction Agent"),
            reply: "Here are the extracted invoice fields.".to_string(),
            run_status: RunStatus::Completed,
            failing: HashSet::new(),
            state: Mutex::new(MockState::default()),
        }
    }

    /// Set the assistant reply appended by completed runs
    #[must_use]
    pub fn with_reply(mut self, reply: impl Into<String>) -> Self {
        self.reply = reply.into();
        self
    }

    /// Set the terminal status every run reports
    #[must_use]
    pub fn with_run_status(mut self, status: RunStatus) -> Self {
        self.run_status = status;
        self
    }

    /// Make an operation fail with a 500 platform error
    #[must_use]
    pub fn failing(mut self, operation: &'static str) -> Self {
        self.failing.insert(operation);
        self
    }

    /// Snapshot of the call counters
    pub fn calls(&self) -> CallCounts {
        self.state.lock().calls
    }

    /// Thread ids created so far
    pub fn thread_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.state.lock().threads.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn check(&self, operation: &'static str) -> GatewayResult<()> {
        if self.failing.contains(operation) {
            return Err(GatewayError::platform(operation, "injected failure", Some(500)));
        }
        Ok(())
    }
}

fn thread_not_found(operation: &str, thread_id: &str) -> GatewayError {
    GatewayError::platform(operation, format!("No thread found with id '{thread_id}'"), Some(404))
}

#[async_trait]
impl AgentPlatform for MockPlatform {
    fn name(&self) -> &str {
        "mock"
    }

    async fn get_agent(&self, agent_id: &str) -> GatewayResult<AgentInfo> {
        self.state.lock().calls.get_agent += 1;
        self.check("get_agent")?;
        if agent_id != self.agent.id {
            return Err(GatewayError::platform(
                "get_agent",
                format!("No assistant found with id '{agent_id}'"),
                Some(404),
            ));
        }
        Ok(self.agent.clone())
    }

    async fn create_thread(&self) -> GatewayResult<Thread> {
        let mut state = self.state.lock();
        state.calls.create_thread += 1;
        self.check("create_thread")?;
        let id = state.next_id("thread");
        let created_at = state.next_time();
        state.threads.insert(id.clone(), Vec::new());
        Ok(Thread {
            id,
            created_at: Some(created_at),
        })
    }

    async fn post_message(&self, thread_id: &str, content: &str) -> GatewayResult<ThreadMessage> {
        let mut state = self.state.lock();
        state.calls.post_message += 1;
        self.check("post_message")?;
        if !state.threads.contains_key(thread_id) {
            return Err(thread_not_found("post_message", thread_id));
        }
        let message = ThreadMessage {
            id: state.next_id("msg"),
            role: "user".to_string(),
            created_at: Some(state.next_time()),
            text_segments: vec![content.to_string()],
        };
        if let Some(messages) = state.threads.get_mut(thread_id) {
            messages.push(message.clone());
        }
        Ok(message)
    }

    async fn run_and_wait(&self, thread_id: &str, _agent_id: &str) -> GatewayResult<Run> {
        let mut state = self.state.lock();
        state.calls.run_and_wait += 1;
        self.check("run_and_wait")?;
        if !state.threads.contains_key(thread_id) {
            return Err(thread_not_found("run_and_wait", thread_id));
        }
        let run_id = state.next_id("run");

        if self.run_status == RunStatus::Completed {
            let reply = ThreadMessage {
                id: state.next_id("msg"),
                role: "assistant".to_string(),
                created_at: Some(state.next_time()),
                text_segments: vec![self.reply.clone()],
            };
            if let Some(messages) = state.threads.get_mut(thread_id) {
                messages.push(reply);
            }
        }

        let last_error = (self.run_status == RunStatus::Failed).then(|| RunError {
            code: Some("server_error".to_string()),
            message: Self::RUN_ERROR_MESSAGE.to_string(),
        });

        Ok(Run {
            id: run_id,
            status: self.run_status,
            last_error,
        })
    }

    async fn list_messages(&self, thread_id: &str) -> GatewayResult<Vec<ThreadMessage>> {
        let mut state = self.state.lock();
        state.calls.list_messages += 1;
        self.check("list_messages")?;
        state
            .threads
            .get(thread_id)
            .cloned()
            .ok_or_else(|| thread_not_found("list_messages", thread_id))
    }
}
