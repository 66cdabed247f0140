//! End-to-end tests for the invoice agent HTTP API.
//!
//! The router runs against the in-memory platform from `gateway_core::testing`,
//! so every request goes through extractors, handlers, the agent service and
//! the middleware stack.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use gateway_core::testing::MockPlatform;
use gateway_core::{InvoiceAgentService, RunStatus};
use gateway_server::{create_router, AppState};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

async fn connected(platform: Arc<MockPlatform>) -> (Router, Arc<MockPlatform>) {
    let service = InvoiceAgentService::initialize(platform.clone(), MockPlatform::AGENT_ID)
        .await
        .expect("mock agent should connect");
    let state = AppState::builder()
        .service_name("Invoice Agent API")
        .agent(Arc::new(service))
        .build();
    (create_router(state), platform)
}

async fn default_app() -> (Router, Arc<MockPlatform>) {
    connected(Arc::new(MockPlatform::new())).await
}

fn unavailable_app() -> Router {
    create_router(AppState::builder().service_name("Invoice Agent API").build())
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn chat_request(body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/invoice/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn new_thread_request() -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/invoice/new-thread")
        .body(Body::empty())
        .unwrap()
}

fn messages_request(thread_id: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(format!("/api/invoice/thread/{thread_id}/messages"))
        .body(Body::empty())
        .unwrap()
}

#[cfg(test)]
mod health_endpoint_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_health_reports_agent_available() {
        let (app, _) = default_app().await;

        let (status, json) = send(
            &app,
            Request::builder().uri("/").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["service"], "Invoice Agent API");
        assert_eq!(json["agent_available"], true);
        assert!(json["timestamp"].is_string());
        assert!(json["version"].is_string());
    }

    #[tokio::test]
    async fn test_health_without_agent() {
        let (status, json) = send(
            &unavailable_app(),
            Request::builder().uri("/").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["agent_available"], false);
    }
}

#[cfg(test)]
mod unavailable_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_chat_returns_503() {
        let (status, json) =
            send(&unavailable_app(), chat_request(&json!({"message": "hi"}))).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            json,
            json!({"success": false, "error": "Invoice service not available"})
        );
    }

    #[tokio::test]
    async fn test_availability_checked_before_body() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/invoice/chat")
            .body(Body::from("{broken"))
            .unwrap();

        let (status, _) = send(&unavailable_app(), request).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_new_thread_returns_503() {
        let (status, json) = send(&unavailable_app(), new_thread_request()).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_messages_returns_503() {
        let (status, json) = send(&unavailable_app(), messages_request("thread_1")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"], "Invoice service not available");
    }
}

#[cfg(test)]
mod chat_endpoint_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_chat_creates_thread() {
        let (app, platform) = default_app().await;

        let (status, json) = send(
            &app,
            chat_request(&json!({"message": "Extract the fields of invoice INV-1001"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["run_status"], "completed");
        assert!(json.get("error").is_none());

        let thread_id = json["thread_id"].as_str().unwrap();
        assert_eq!(platform.thread_ids(), vec![thread_id.to_string()]);

        let conversation = json["conversation"].as_array().unwrap();
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation[0]["role"], "user");
        assert_eq!(conversation[0]["content"], "Extract the fields of invoice INV-1001");
        assert_eq!(conversation[1]["role"], "assistant");
        assert!(conversation[1]["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_chat_with_thread_id_does_not_create_thread() {
        let (app, platform) = default_app().await;

        let (_, created) = send(&app, new_thread_request()).await;
        let thread_id = created["thread_id"].as_str().unwrap().to_string();
        assert_eq!(platform.calls().create_thread, 1);

        let (status, json) = send(
            &app,
            chat_request(&json!({"message": "What is the total?", "thread_id": thread_id})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["thread_id"], thread_id.as_str());
        assert_eq!(platform.calls().create_thread, 1);
    }

    #[tokio::test]
    async fn test_missing_message_is_rejected() {
        let (app, platform) = default_app().await;

        let (status, json) = send(&app, chat_request(&json!({"thread_id": "thread_1"}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json,
            json!({"success": false, "error": "Missing 'message' in request body"})
        );
        assert_eq!(platform.calls().request_calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_body_is_rejected() {
        let (app, platform) = default_app().await;

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/invoice/chat")
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(&app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Missing 'message' in request body");
        assert_eq!(platform.calls().request_calls(), 0);
    }

    #[tokio::test]
    async fn test_malformed_json_is_rejected() {
        let (app, platform) = default_app().await;

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/invoice/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"message\": "))
            .unwrap();
        let (status, json) = send(&app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
        assert_eq!(platform.calls().request_calls(), 0);
    }

    #[tokio::test]
    async fn test_non_string_message_is_rejected() {
        let (app, _) = default_app().await;

        let (status, json) = send(&app, chat_request(&json!({"message": 42}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_array_body_is_rejected() {
        let (app, platform) = default_app().await;

        let (status, json) = send(&app, chat_request(&json!(["hi"]))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json,
            json!({"success": false, "error": "Missing 'message' in request body"})
        );
        assert_eq!(platform.calls().request_calls(), 0);
    }

    #[tokio::test]
    async fn test_scalar_body_is_rejected() {
        let (app, platform) = default_app().await;

        let (status, json) = send(&app, chat_request(&json!("hi"))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
        assert_eq!(platform.calls().request_calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_run_returns_500_with_thread_id() {
        let (app, _) =
            connected(Arc::new(MockPlatform::new().with_run_status(RunStatus::Failed))).await;

        let (status, json) = send(&app, chat_request(&json!({"message": "hi"}))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["success"], false);
        assert_eq!(json["run_status"], "failed");
        assert!(json["thread_id"].is_string());
        assert!(json.get("conversation").is_none());
        assert_eq!(
            json["error"],
            format!("Agent run failed: server_error: {}", MockPlatform::RUN_ERROR_MESSAGE)
        );
    }

    #[tokio::test]
    async fn test_platform_error_keeps_thread_id() {
        let (app, _) = connected(Arc::new(MockPlatform::new().failing("post_message"))).await;

        let (status, json) = send(&app, chat_request(&json!({"message": "hi"}))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["success"], false);
        assert!(json["thread_id"].is_string());
        assert!(json["error"]
            .as_str()
            .unwrap()
            .starts_with("Error processing message: "));
    }

    #[tokio::test]
    async fn test_unknown_thread_is_a_failure() {
        let (app, _) = default_app().await;

        let (status, json) = send(
            &app,
            chat_request(&json!({"message": "hi", "thread_id": "thread_missing"})),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["thread_id"], "thread_missing");
    }
}

#[cfg(test)]
mod thread_endpoint_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_new_thread() {
        let (app, platform) = default_app().await;

        let (status, json) = send(&app, new_thread_request()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert!(json["created_at"].is_string());
        assert_eq!(platform.thread_ids(), vec![json["thread_id"].as_str().unwrap().to_string()]);
    }

    #[tokio::test]
    async fn test_new_thread_failure() {
        let (app, _) = connected(Arc::new(MockPlatform::new().failing("create_thread"))).await;

        let (status, json) = send(&app, new_thread_request()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["success"], false);
        assert!(json["error"]
            .as_str()
            .unwrap()
            .starts_with("Failed to create thread: "));
    }

    #[tokio::test]
    async fn test_messages_of_unknown_thread() {
        let (app, _) = default_app().await;

        let (status, json) = send(&app, messages_request("thread_missing")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["error"]
            .as_str()
            .unwrap()
            .starts_with("Failed to get messages: "));
    }

    #[tokio::test]
    async fn test_messages_are_idempotent() {
        let (app, _) = default_app().await;

        let (_, chat) = send(&app, chat_request(&json!({"message": "hi"}))).await;
        let thread_id = chat["thread_id"].as_str().unwrap();

        let (_, first) = send(&app, messages_request(thread_id)).await;
        let (_, second) = send(&app, messages_request(thread_id)).await;

        assert_eq!(first, second);
        assert_eq!(first["messages"], chat["conversation"]);
    }
}

#[cfg(test)]
mod scenario_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_new_thread_chat_then_messages() {
        let (app, platform) = connected(Arc::new(
            MockPlatform::new().with_reply("Vendor: Contoso Ltd. Total: 1,250.00 USD"),
        ))
        .await;

        let (status, thread) = send(&app, new_thread_request()).await;
        assert_eq!(status, StatusCode::OK);
        let thread_id = thread["thread_id"].as_str().unwrap();

        let (status, chat) = send(
            &app,
            chat_request(&json!({
                "message": "Summarize invoice INV-2024-001",
                "thread_id": thread_id
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(chat["thread_id"], thread_id);

        let (status, messages) = send(&app, messages_request(thread_id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(messages["success"], true);
        assert_eq!(messages["thread_id"], thread_id);

        let contents: Vec<&str> = messages["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["content"].as_str().unwrap())
            .collect();
        assert_eq!(
            contents,
            vec![
                "Summarize invoice INV-2024-001",
                "Vendor: Contoso Ltd. Total: 1,250.00 USD"
            ]
        );

        assert_eq!(platform.calls().create_thread, 1);
        assert_eq!(platform.calls().run_and_wait, 1);
    }
}

#[cfg(test)]
mod error_handling_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_unknown_route_returns_json_404() {
        let (app, _) = default_app().await;

        let (status, json) = send(
            &app,
            Request::builder()
                .uri("/api/invoice/unknown")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_cors_headers_present() {
        let (app, _) = default_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(header::ORIGIN, "https://portal.example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }
}
