//! HTTP request handlers for the gateway API.

use axum::{
    extract::{Path, State},
    http::{StatusCode, Uri},
    Json,
};
use chrono::{SecondsFormat, Utc};
use gateway_core::{ChatEnvelope, ConversationMessage};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::{
    error::ApiError,
    extractors::{AvailableAgent, JsonBody, RequestId},
    state::AppState,
};

/// Message returned when a chat request carries no `message`
pub const MISSING_MESSAGE: &str = "Missing 'message' in request body";

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `healthy` while the process serves requests
    pub status: String,
    /// Configured service name
    pub service: String,
    /// Gateway version
    pub version: String,
    /// Current server time
    pub timestamp: String,
    /// Whether the agent platform connected at startup
    pub agent_available: bool,
}

/// Chat request body
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// User message text
    pub message: Option<String>,
    /// Existing thread to continue
    #[serde(default)]
    pub thread_id: Option<String>,
}

impl ChatRequest {
    /// Read a chat request from a parsed body.
    ///
    /// Only a JSON object carrying a string `message` is accepted.
    pub fn from_body(body: Value) -> Result<(String, Option<String>), ApiError> {
        let Value::Object(fields) = body else {
            return Err(ApiError::bad_request(MISSING_MESSAGE));
        };

        let request: Self = serde_json::from_value(Value::Object(fields))
            .map_err(|e| ApiError::bad_request(format!("Invalid request body: {e}")))?;

        match request.message {
            Some(message) => Ok((message, request.thread_id)),
            None => Err(ApiError::bad_request(MISSING_MESSAGE)),
        }
    }
}

/// New thread response
#[derive(Debug, Serialize, Deserialize)]
pub struct NewThreadResponse {
    /// Always `true`
    pub success: bool,
    /// Identifier of the created thread
    pub thread_id: String,
    /// Creation time
    pub created_at: String,
}

/// Thread messages response
#[derive(Debug, Serialize, Deserialize)]
pub struct ThreadMessagesResponse {
    /// Always `true`
    pub success: bool,
    /// Thread the messages belong to
    pub thread_id: String,
    /// Messages in ascending creation order
    pub messages: Vec<ConversationMessage>,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: state.service_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false),
        agent_available: state.agent_available(),
    })
}

/// Send a message to the agent and return the resulting conversation
#[instrument(skip_all, fields(request_id = %request_id))]
pub async fn chat(
    AvailableAgent(agent): AvailableAgent,
    RequestId(request_id): RequestId,
    JsonBody(body): JsonBody<Value>,
) -> Result<(StatusCode, Json<ChatEnvelope>), ApiError> {
    let (message, thread_id) = ChatRequest::from_body(body)?;

    match agent.send_message(&message, thread_id.as_deref()).await {
        Ok(reply) => {
            info!(
                thread_id = %reply.thread_id,
                messages = reply.conversation.len(),
                "Chat completed"
            );
            Ok((StatusCode::OK, Json(reply.into())))
        }
        Err(failure) => {
            warn!(thread_id = ?failure.thread_id, error = %failure.error, "Chat failed");
            Ok((StatusCode::INTERNAL_SERVER_ERROR, Json(failure.into())))
        }
    }
}

/// Create a new conversation thread
#[instrument(skip_all)]
pub async fn new_thread(
    AvailableAgent(agent): AvailableAgent,
) -> Result<Json<NewThreadResponse>, ApiError> {
    let thread = agent.create_thread().await.map_err(|e| {
        warn!(error = %e, "Thread creation failed");
        ApiError::from_gateway("Failed to create thread", &e)
    })?;

    info!(thread_id = %thread.id, "Thread created");

    let created_at = thread.created_at.unwrap_or_else(Utc::now);
    Ok(Json(NewThreadResponse {
        success: true,
        thread_id: thread.id,
        created_at: created_at.to_rfc3339_opts(SecondsFormat::Secs, false),
    }))
}

/// List the messages of a thread
#[instrument(skip(agent))]
pub async fn thread_messages(
    AvailableAgent(agent): AvailableAgent,
    Path(thread_id): Path<String>,
) -> Result<Json<ThreadMessagesResponse>, ApiError> {
    let messages = agent.list_messages(&thread_id).await.map_err(|e| {
        warn!(error = %e, "Listing messages failed");
        ApiError::from_gateway("Failed to get messages", &e)
    })?;

    Ok(Json(ThreadMessagesResponse {
        success: true,
        thread_id,
        messages,
    }))
}

/// Fallback for unknown routes
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("Not found: {}", uri.path()))
}
