//! Custom Axum extractors for the gateway.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
};
use gateway_core::InvoiceAgentService;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

use crate::{error::ApiError, state::AppState};

/// Message returned while no agent service is connected
pub const SERVICE_UNAVAILABLE: &str = "Invoice service not available";

/// Request id set by the request-id layer, or generated if absent
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map_or_else(|| uuid::Uuid::new_v4().to_string(), String::from);

        Ok(Self(id))
    }
}

/// The connected agent service; rejects with 503 when there is none.
///
/// Place it before any body extractor so the availability check runs first.
#[derive(Debug, Clone)]
pub struct AvailableAgent(pub Arc<InvoiceAgentService>);

#[async_trait]
impl FromRequestParts<AppState> for AvailableAgent {
    type Rejection = ApiError;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        state
            .agent
            .clone()
            .map(Self)
            .ok_or_else(|| ApiError::service_unavailable(SERVICE_UNAVAILABLE))
    }
}

/// JSON body extractor that reports parse failures as `{success:false, error}`.
///
/// The content type is not checked and an empty body reads as `null`.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = axum::body::Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read request body: {e}")))?;

        let slice: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            &bytes
        };

        let value: T = serde_json::from_slice(slice).map_err(|e| {
            debug!(error = %e, "JSON parse error");
            ApiError::bad_request(format!("Invalid JSON: {e}"))
        })?;

        Ok(Self(value))
    }
}
