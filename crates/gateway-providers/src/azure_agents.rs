//! Azure AI Foundry Agent Service client.
//!
//! Talks to the project-scoped Agents REST API:
//! `{endpoint}/assistants/{id}`, `{endpoint}/threads`,
//! `{endpoint}/threads/{id}/messages` and `{endpoint}/threads/{id}/runs`,
//! each with an `api-version` query parameter and a bearer token.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gateway_core::{
    AgentInfo, AgentPlatform, GatewayError, GatewayResult, Run, RunStatus, Thread, ThreadMessage,
};
use gateway_telemetry::platform_span;
use reqwest::{Client, Method, RequestBuilder};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn, Instrument};
use url::Url;

use crate::credential::{CredentialChain, TokenCredential, AI_SCOPE};

/// Default Agents REST API version
pub const DEFAULT_API_VERSION: &str = "v1";

/// Page size used when listing thread messages
const MESSAGE_PAGE_SIZE: u32 = 100;

const PLATFORM_NAME: &str = "azure-ai-agents";

/// Azure AI Agents client configuration
#[derive(Debug, Clone)]
pub struct AzureAgentsConfig {
    /// Project endpoint, e.g. `https://acct.services.ai.azure.com/api/projects/invoices`
    pub endpoint: Url,
    /// REST API version
    pub api_version: String,
    /// Interval between run status polls
    pub poll_interval: Duration,
    /// Upper bound on waiting for a run; unbounded when `None`
    pub run_timeout: Option<Duration>,
    /// Timeout for each HTTP call
    pub request_timeout: Duration,
}

impl AzureAgentsConfig {
    /// Create a configuration with defaults for everything but the endpoint
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            api_version: DEFAULT_API_VERSION.to_string(),
            poll_interval: Duration::from_secs(1),
            run_timeout: None,
            request_timeout: Duration::from_secs(300),
        }
    }

    /// Set the API version
    #[must_use]
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Set the run poll interval
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Bound the time spent waiting for a run
    #[must_use]
    pub fn with_run_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.run_timeout = timeout;
        self
    }

    /// Set the per-request timeout
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// [`AgentPlatform`] backed by the Azure AI Agents REST API
pub struct AzureAgentsClient {
    config: AzureAgentsConfig,
    http: Client,
    credential: Arc<dyn TokenCredential>,
}

impl AzureAgentsClient {
    /// Create a client.
    ///
    /// # Errors
    /// Returns an error if the endpoint cannot carry path segments or the HTTP
    /// client cannot be built.
    pub fn new(
        config: AzureAgentsConfig,
        credential: Arc<dyn TokenCredential>,
    ) -> GatewayResult<Self> {
        let http = build_http(&config)?;
        Ok(Self {
            config,
            http,
            credential,
        })
    }

    /// Create a client authenticating through [`CredentialChain::from_env`].
    ///
    /// # Errors
    /// Returns an error if the endpoint is unusable or no credential source is
    /// configured.
    pub fn from_env(config: AzureAgentsConfig) -> GatewayResult<Self> {
        let http = build_http(&config)?;
        let credential = CredentialChain::from_env(http.clone())?;
        Ok(Self {
            config,
            http,
            credential: Arc::new(credential),
        })
    }

    /// Client configuration
    pub fn config(&self) -> &AzureAgentsConfig {
        &self.config
    }

    fn url(&self, segments: &[&str]) -> GatewayResult<Url> {
        let mut url = self.config.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| GatewayError::configuration("Invalid project endpoint"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> GatewayResult<RequestBuilder> {
        Ok(self
            .http
            .request(method, self.url(segments)?)
            .query(&[("api-version", self.config.api_version.as_str())]))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> GatewayResult<T> {
        let token = self.credential.get_token(AI_SCOPE).await?;

        let response = request
            .bearer_auth(token.token.expose_secret())
            .send()
            .await
            .map_err(|e| GatewayError::platform(operation, format!("Request failed: {e}"), None))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_error(operation, status.as_u16(), &body));
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::invalid_response(format!("{operation}: {e}")))
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> GatewayResult<Run> {
        let request = self.request(Method::GET, &["threads", thread_id, "runs", run_id])?;
        self.send("get_run", request).await
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> GatewayResult<Run> {
        let request =
            self.request(Method::POST, &["threads", thread_id, "runs", run_id, "cancel"])?;
        self.send("cancel_run", request).await
    }

    async fn wait_for_run(&self, thread_id: &str, mut run: Run) -> GatewayResult<Run> {
        let started = Instant::now();
        let mut cancel_requested = false;

        while !run.status.is_terminal() {
            if let Some(limit) = self.config.run_timeout {
                if started.elapsed() >= limit {
                    if let Err(e) = self.cancel_run(thread_id, &run.id).await {
                        warn!(run_id = %run.id, error = %e, "Failed to cancel timed out run");
                    }
                    return Err(GatewayError::RunTimeout {
                        run_id: run.id,
                        timeout: limit,
                    });
                }
            }

            // Tool calls are not served here; a run asking for one is cancelled.
            if run.status == RunStatus::RequiresAction && !cancel_requested {
                warn!(run_id = %run.id, "Run requires tool outputs, cancelling");
                run = self.cancel_run(thread_id, &run.id).await?;
                cancel_requested = true;
                continue;
            }

            tokio::time::sleep(self.config.poll_interval).await;
            run = self.get_run(thread_id, &run.id).await?;
            debug!(run_id = %run.id, status = %run.status, "Polled run");
        }

        Ok(run)
    }

    async fn fetch_agent(&self, agent_id: &str) -> GatewayResult<AgentInfo> {
        let request = self.request(Method::GET, &["assistants", agent_id])?;
        self.send("get_agent", request).await
    }

    async fn open_thread(&self) -> GatewayResult<Thread> {
        let request = self.request(Method::POST, &["threads"])?.json(&json!({}));
        let thread: ThreadObject = self.send("create_thread", request).await?;
        Ok(thread.into())
    }

    async fn add_message(&self, thread_id: &str, content: &str) -> GatewayResult<ThreadMessage> {
        let request = self
            .request(Method::POST, &["threads", thread_id, "messages"])?
            .json(&json!({ "role": "user", "content": content }));
        let message: MessageObject = self.send("post_message", request).await?;
        Ok(message.into())
    }

    async fn start_run(&self, thread_id: &str, agent_id: &str) -> GatewayResult<Run> {
        let request = self
            .request(Method::POST, &["threads", thread_id, "runs"])?
            .json(&json!({ "assistant_id": agent_id }));
        let run: Run = self.send("create_run", request).await?;
        debug!(run_id = %run.id, status = %run.status, "Run created");
        self.wait_for_run(thread_id, run).await
    }

    async fn fetch_messages(&self, thread_id: &str) -> GatewayResult<Vec<ThreadMessage>> {
        let limit = MESSAGE_PAGE_SIZE.to_string();
        let mut messages = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let mut request = self
                .request(Method::GET, &["threads", thread_id, "messages"])?
                .query(&[("order", "asc"), ("limit", limit.as_str())]);
            if let Some(cursor) = &after {
                request = request.query(&[("after", cursor.as_str())]);
            }

            let page: MessagePage = self.send("list_messages", request).await?;
            let next = page.last_id.clone();
            let empty = page.data.is_empty();
            messages.extend(page.data.into_iter().map(ThreadMessage::from));

            match next {
                Some(cursor) if page.has_more => {
                    if empty || after.as_deref() == Some(cursor.as_str()) {
                        return Err(GatewayError::invalid_response(format!(
                            "message listing for thread {thread_id} did not advance past {cursor}"
                        )));
                    }
                    after = Some(cursor);
                }
                _ => break,
            }
        }

        Ok(messages)
    }
}

#[async_trait]
impl AgentPlatform for AzureAgentsClient {
    fn name(&self) -> &str {
        PLATFORM_NAME
    }

    async fn get_agent(&self, agent_id: &str) -> GatewayResult<AgentInfo> {
        self.fetch_agent(agent_id)
            .instrument(platform_span!(PLATFORM_NAME, "get_agent"))
            .await
    }

    async fn create_thread(&self) -> GatewayResult<Thread> {
        self.open_thread()
            .instrument(platform_span!(PLATFORM_NAME, "create_thread"))
            .await
    }

    async fn post_message(&self, thread_id: &str, content: &str) -> GatewayResult<ThreadMessage> {
        self.add_message(thread_id, content)
            .instrument(platform_span!(PLATFORM_NAME, "post_message", thread_id))
            .await
    }

    async fn run_and_wait(&self, thread_id: &str, agent_id: &str) -> GatewayResult<Run> {
        self.start_run(thread_id, agent_id)
            .instrument(platform_span!(PLATFORM_NAME, "run_and_wait", thread_id))
            .await
    }

    async fn list_messages(&self, thread_id: &str) -> GatewayResult<Vec<ThreadMessage>> {
        self.fetch_messages(thread_id)
            .instrument(platform_span!(PLATFORM_NAME, "list_messages", thread_id))
            .await
    }
}

fn build_http(config: &AzureAgentsConfig) -> GatewayResult<Client> {
    if config.endpoint.cannot_be_a_base() {
        return Err(GatewayError::configuration(format!(
            "Invalid project endpoint: {}",
            config.endpoint
        )));
    }

    Client::builder()
        .timeout(config.request_timeout)
        .build()
        .map_err(|e| GatewayError::configuration(format!("Failed to create HTTP client: {e}")))
}

fn map_error(operation: &str, status: u16, body: &str) -> GatewayError {
    let message = match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse { error }) => match error.code {
            Some(code) => format!("{code}: {}", error.message),
            None => error.message,
        },
        Err(_) if body.trim().is_empty() => "no response body".to_string(),
        Err(_) => body.trim().to_string(),
    };
    GatewayError::platform(operation, message, Some(status))
}

fn timestamp(secs: Option<i64>) -> Option<DateTime<Utc>> {
    secs.and_then(|s| DateTime::from_timestamp(s, 0))
}

#[derive(Debug, Deserialize)]
struct ThreadObject {
    id: String,
    #[serde(default)]
    created_at: Option<i64>,
}

impl From<ThreadObject> for Thread {
    fn from(thread: ThreadObject) -> Self {
        Self {
            id: thread.id,
            created_at: timestamp(thread.created_at),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessageObject {
    id: String,
    role: String,
    #[serde(default)]
    created_at: Option<i64>,
    #[serde(default)]
    content: Vec<MessageContent>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum MessageContent {
    Text { text: TextContent },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct TextContent {
    value: String,
}

impl From<MessageObject> for ThreadMessage {
    fn from(message: MessageObject) -> Self {
        let text_segments = message
            .content
            .into_iter()
            .filter_map(|part| match part {
                MessageContent::Text { text } => Some(text.value),
                MessageContent::Other => None,
            })
            .collect();

        Self {
            id: message.id,
            role: message.role,
            created_at: timestamp(message.created_at),
            text_segments,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessagePage {
    #[serde(default)]
    data: Vec<MessageObject>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    last_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: String,
}
