//! Route definitions for the gateway API.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
};

use crate::{handlers, middleware, state::AppState};

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health_check))
        .nest("/api/invoice", invoice_routes())
        .fallback(handlers::not_found)
        // Innermost first: panics are converted before logging sees the response
        .layer(CatchPanicLayer::custom(middleware::panic_response))
        .layer(axum::middleware::from_fn(middleware::logging_middleware))
        .layer(middleware::trace_layer())
        .layer(middleware::cors_layer())
        .layer(PropagateRequestIdLayer::new(
            middleware::REQUEST_ID_HEADER.clone(),
        ))
        .layer(SetRequestIdLayer::new(
            middleware::REQUEST_ID_HEADER.clone(),
            MakeRequestUuid,
        ))
        .with_state(state)
}

/// Invoice agent routes
fn invoice_routes() -> Router<AppState> {
    Router::new()
        .route("/chat", post(handlers::chat))
        .route("/new-thread", post(handlers::new_thread))
        .route("/thread/:thread_id/messages", get(handlers::thread_messages))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    fn create_test_state() -> AppState {
        AppState::builder().service_name("Invoice Agent API").build()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("x-request-id", "caller-supplied")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()["x-request-id"], "caller-supplied");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_panic_becomes_500() {
        async fn boom() -> &'static str {
            panic!("handler exploded")
        }

        let app = Router::new()
            .route("/boom", get(boom))
            .layer(CatchPanicLayer::custom(middleware::panic_response));

        let response = app
            .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
