//! HTTP client for the gateway API.

use anyhow::{Context, Result};
use gateway_core::{ChatEnvelope, ConversationMessage};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Body of `GET /`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReply {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub agent_available: bool,
}

/// Body of `POST /api/invoice/new-thread`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewThreadReply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of `GET /api/invoice/thread/:id/messages`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesReply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub messages: Vec<ConversationMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A decoded response with its HTTP status
#[derive(Debug)]
pub struct Reply<T> {
    pub status: StatusCode,
    pub body: T,
}

/// Client for one gateway instance
#[derive(Debug, Clone)]
pub struct GatewayClient {
    base_url: Url,
    http: reqwest::Client,
}

impl GatewayClient {
    /// Create a client for `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .with_context(|| format!("Invalid gateway URL: {base_url}"))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Invalid gateway URL: {base_url}");
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { base_url, http })
    }

    /// Gateway base URL
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<Reply<T>> {
        let status = response.status();
        let bytes = response.bytes().await.context("Failed to read response body")?;
        debug!(%status, bytes = bytes.len(), "Gateway response");

        let body = serde_json::from_slice(&bytes).with_context(|| {
            format!(
                "Unexpected response ({status}): {}",
                String::from_utf8_lossy(&bytes)
            )
        })?;
        Ok(Reply { status, body })
    }

    /// `GET /`
    pub async fn health(&self) -> Result<Reply<HealthReply>> {
        let response = self
            .http
            .get(self.url(&[]))
            .send()
            .await
            .with_context(|| format!("Failed to connect to {}", self.base_url))?;
        Self::read(response).await
    }

    /// `POST /api/invoice/new-thread`
    pub async fn new_thread(&self) -> Result<Reply<NewThreadReply>> {
        let response = self
            .http
            .post(self.url(&["api", "invoice", "new-thread"]))
            .send()
            .await
            .with_context(|| format!("Failed to connect to {}", self.base_url))?;
        Self::read(response).await
    }

    /// `POST /api/invoice/chat`
    pub async fn chat(
        &self,
        message: &str,
        thread_id: Option<&str>,
    ) -> Result<Reply<ChatEnvelope>> {
        let mut payload = json!({ "message": message });
        if let Some(thread_id) = thread_id.filter(|t| !t.is_empty()) {
            payload["thread_id"] = json!(thread_id);
        }

        let response = self
            .http
            .post(self.url(&["api", "invoice", "chat"]))
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("Failed to connect to {}", self.base_url))?;
        Self::read(response).await
    }

    /// `GET /api/invoice/thread/:thread_id/messages`
    pub async fn messages(&self, thread_id: &str) -> Result<Reply<MessagesReply>> {
        let response = self
            .http
            .get(self.url(&["api", "invoice", "thread", thread_id, "messages"]))
            .send()
            .await
            .with_context(|| format!("Failed to connect to {}", self.base_url))?;
        Self::read(response).await
    }
}
