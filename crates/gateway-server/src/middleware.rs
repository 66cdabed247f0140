//! Request middleware and layers.

use axum::{
    body::Body,
    extract::Request,
    http::HeaderName,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::any::Any;
use std::time::Instant;
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    cors::CorsLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn, Span};

use crate::error::ApiError;

/// Header carrying the request id
pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Log method, path, status and latency of every request
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let latency_ms = started.elapsed().as_millis();
    if response.status().is_server_error() {
        warn!(%method, %path, status, latency_ms, "Request failed");
    } else {
        info!(%method, %path, status, latency_ms, "Request completed");
    }

    response
}

/// Span constructor used by [`trace_layer`]
pub type MakeSpan = fn(&Request<Body>) -> Span;

/// Span per request, tagged with the request id
pub fn trace_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>, MakeSpan> {
    TraceLayer::new_for_http().make_span_with(request_span as MakeSpan)
}

fn request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    tracing::info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
    )
}

/// Permissive CORS
pub fn cors_layer() -> CorsLayer {
    CorsLayer::permissive()
}

/// Turn a handler panic into a 500 JSON response
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    error!(panic = %detail, "Handler panicked");
    ApiError::internal("Internal server error").into_response()
}
