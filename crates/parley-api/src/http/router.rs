//! Axum router configuration with middleware.
//!
//! All routes are under `/api/`.
//! Middleware: CORS (any origin, method and header), request tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/chat", post(handlers::chat::chat))
        .route("/heartbeat", get(handlers::heartbeat::heartbeat))
        .route("/sessions/{id}", get(handlers::session::get_session));

    Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use parley_core::chat::service::{ChatService, ExchangeSettings};
    use parley_core::llm::box_provider::BoxLlmProvider;
    use parley_core::llm::provider::LlmProvider;
    use parley_core::session::memory::InMemorySessionStore;
    use parley_infra::backend::SessionBackend;
    use parley_infra::llm::fixed::FixedReplyProvider;
    use parley_types::config::{ChatConfig, LlmConfig, ResponderFailurePolicy};
    use parley_types::llm::{CompletionRequest, CompletionResponse, LlmError};

    use super::*;

    struct Unreachable;

    impl LlmProvider for Unreachable {
        fn name(&self) -> &str {
            "unreachable"
        }

        async fn complete(&self, _: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
            Err(LlmError::Provider {
                message: "connection refused".to_string(),
            })
        }
    }

    struct Slow;

    impl LlmProvider for Slow {
        fn name(&self) -> &str {
            "slow"
        }

        async fn complete(&self, _: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Err(LlmError::Provider {
                message: "should have timed out".to_string(),
            })
        }
    }

    fn settings() -> ExchangeSettings {
        ExchangeSettings::from_config(&LlmConfig::default(), &ChatConfig::default())
    }

    fn app_with_settings(provider: BoxLlmProvider, settings: ExchangeSettings) -> Router {
        let store = Arc::new(SessionBackend::Memory(InMemorySessionStore::new()));
        let service = ChatService::new(store, provider, settings);
        build_router(AppState::from_parts(service, PathBuf::from("/tmp/parley-test")))
    }

    fn app_with(provider: BoxLlmProvider, timeout: Duration) -> Router {
        app_with_settings(
            provider,
            ExchangeSettings {
                timeout,
                ..settings()
            },
        )
    }

    fn app() -> Router {
        app_with(
            BoxLlmProvider::new(FixedReplyProvider::new("Hello from the LLM")),
            Duration::from_secs(5),
        )
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn post_chat(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_heartbeat_reports_running() {
        let app = app();
        let (status, body) = send(&app, get_request("/api/heartbeat")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "API is running !");
        assert_eq!(body["sessions"], 0);
    }

    #[tokio::test]
    async fn test_chat_without_session_creates_one() {
        let app = app();
        let (status, body) = send(&app, post_chat(json!({"message": "hi"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Hello from the LLM");
        let session_id = body["session_id"].as_str().unwrap();
        assert!(!session_id.is_empty());

        let (_, heartbeat) = send(&app, get_request("/api/heartbeat")).await;
        assert_eq!(heartbeat["sessions"], 1);
    }

    #[tokio::test]
    async fn test_chat_continues_session_and_transcript_accumulates() {
        let app = app();
        let (_, first) = send(&app, post_chat(json!({"message": "one"}))).await;
        let id = first["session_id"].as_str().unwrap().to_string();

        let (status, second) =
            send(&app, post_chat(json!({"message": "two", "session_id": id}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["session_id"], id.as_str());

        let (status, record) = send(&app, get_request(&format!("/api/sessions/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        let context = record["context"].as_array().unwrap();
        let contents: Vec<&str> = context
            .iter()
            .map(|t| t["content"].as_str().unwrap())
            .collect();
        assert_eq!(
            contents,
            vec!["one", "Hello from the LLM", "two", "Hello from the LLM"]
        );
        assert_eq!(context[0]["role"], "user");
        assert_eq!(context[1]["role"], "assistant");
    }

    #[tokio::test]
    async fn test_chat_with_empty_session_id_starts_new_session() {
        let app = app();
        let (status, body) =
            send(&app, post_chat(json!({"message": "hi", "session_id": ""}))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(!body["session_id"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_chat_with_unknown_session_is_404() {
        let app = app();
        let (status, body) = send(
            &app,
            post_chat(json!({"message": "hi", "session_id": "does-not-exist"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["detail"].as_str().unwrap().contains("does-not-exist"));
    }

    #[tokio::test]
    async fn test_unknown_transcript_is_404() {
        let app = app();
        let (status, _) = send(&app, get_request("/api/sessions/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_body_is_400() {
        let app = app();
        let request = Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn test_missing_message_field_is_400() {
        let app = app();
        let (status, _) = send(&app, post_chat(json!({"session_id": "abc"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_blank_message_is_400() {
        let app = app();
        let (status, _) = send(&app, post_chat(json!({"message": "   "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_responder_failure_is_502() {
        let app = app_with(BoxLlmProvider::new(Unreachable), Duration::from_secs(5));
        let (status, body) = send(&app, post_chat(json!({"message": "hi"}))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["detail"].as_str().unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_failed_first_exchange_leaves_no_session() {
        let app = app_with(BoxLlmProvider::new(Unreachable), Duration::from_secs(5));
        let (status, body) = send(&app, post_chat(json!({"message": "hi"}))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.get("session_id").is_none());

        let (_, heartbeat) = send(&app, get_request("/api/heartbeat")).await;
        assert_eq!(heartbeat["sessions"], 0);
    }

    #[tokio::test]
    async fn test_persisted_user_turn_is_reachable_after_failure() {
        let app = app_with_settings(
            BoxLlmProvider::new(Unreachable),
            ExchangeSettings {
                failure_policy: ResponderFailurePolicy::PersistUserTurn,
                ..settings()
            },
        );
        let (status, body) = send(&app, post_chat(json!({"message": "hi"}))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["detail"].as_str().unwrap().contains("connection refused"));
        let id = body["session_id"].as_str().unwrap().to_string();

        let (status, record) = send(&app, get_request(&format!("/api/sessions/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            record["context"],
            json!([{"role": "user", "content": "hi"}])
        );
    }

    #[tokio::test]
    async fn test_responder_timeout_is_504() {
        let app = app_with(BoxLlmProvider::new(Slow), Duration::from_millis(20));
        let (status, _) = send(&app, post_chat(json!({"message": "hi"}))).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let app = app();
        let request = Request::builder()
            .uri("/api/heartbeat")
            .header(header::ORIGIN, "http://example.com")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap()
                .to_str()
                .unwrap(),
            "*"
        );
    }
}
