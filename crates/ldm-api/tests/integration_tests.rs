//! Integration tests for the modeling assistant API.
//!
//! Every test builds its own router around a scripted language-model
//! backend, so no network access is needed.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use ldm_api::create_router;
use ldm_api::error::ErrorBody;
use ldm_api::handlers::{ChatResponseBody, HealthResponse, HistoryResponse, ResetResponse};
use ldm_api::state::AppState;
use ldm_chat::ScriptedBackend;
use ldm_core::config::LdmConfig;
use ldm_core::types::{Intent, Role, TurnContent};

// =============================================================================
// Helpers
// =============================================================================

const LIBRARY_JSON: &str = r#"{
    "id": "library-model",
    "name": "Library",
    "entities": [
        {"id": "book", "name": "Book", "position": {"x": 0, "y": 0}, "attributes": [
            {"id": "book_id", "name": "book_id", "type": "integer", "isPrimaryKey": true, "isForeignKey": false},
            {"id": "title", "name": "title", "type": "string", "isPrimaryKey": false, "isForeignKey": false}
        ]},
        {"id": "member", "name": "Member", "position": {"x": 320, "y": 0}, "attributes": [
            {"id": "member_id", "name": "member_id", "type": "integer", "isPrimaryKey": true, "isForeignKey": false},
            {"id": "email", "name": "email", "type": "string", "isPrimaryKey": false, "isForeignKey": false, "classification": "PII"}
        ]}
    ],
    "relationships": [
        {"id": "loans", "fromEntity": "member", "toEntity": "book", "type": "one-to-many", "name": "borrows"}
    ]
}"#;

fn make_app_with(config: LdmConfig, backend: Arc<ScriptedBackend>) -> axum::Router {
    create_router(AppState::new(config, backend))
}

fn make_app(backend: Arc<ScriptedBackend>) -> axum::Router {
    make_app_with(LdmConfig::default(), backend)
}

fn chat_request(user: Option<&str>, query: &str) -> Request<Body> {
    let mut builder = Request::post("/model-chat").header("content-type", "application/json");
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    builder
        .body(Body::from(serde_json::json!({ "query": query }).to_string()))
        .unwrap()
}

fn history_request(user: Option<&str>) -> Request<Body> {
    let mut builder = Request::get("/model-chat/history");
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    builder.body(Body::empty()).unwrap()
}

fn reset_request(user: Option<&str>) -> Request<Body> {
    let mut builder = Request::post("/model-chat/reset");
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap()
        .to_vec()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health() {
    let app = make_app(Arc::new(ScriptedBackend::new()));
    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let health: HealthResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.known_users, 0);
}

// =============================================================================
// POST /model-chat
// =============================================================================

#[tokio::test]
async fn test_chat_hello_is_conversational() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.push_reply("CONVO").push_reply("Hello! Tell me what you want to model.");
    let app = make_app(backend);

    let resp = app.oneshot(chat_request(Some("alice"), "hello")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: ChatResponseBody = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(body.intent, Intent::Convo);
    assert_eq!(body.messages.len(), 2);
    assert_eq!(body.messages[0].role, Role::User);
    assert_eq!(body.messages[0].content, TurnContent::Text("hello".to_string()));
    assert_eq!(body.messages[1].role, Role::Assistant);
    assert!(body.messages[1].content.as_text().is_some());
}

#[tokio::test]
async fn test_chat_library_returns_model_object() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.push_reply("MODEL").push_reply(LIBRARY_JSON);
    let app = make_app(backend);

    let resp = app
        .oneshot(chat_request(
            Some("alice"),
            "Create a model for a library with books and members",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(json["intent"], "MODEL");
    let content = &json["messages"][1]["content"];
    assert!(content.is_object());
    assert_eq!(content["name"], "Library");
    let names: Vec<&str> = content["entities"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"Book"));
    assert!(names.contains(&"Member"));
    assert_eq!(content["relationships"][0]["type"], "one-to-many");
    assert!(json["messages"][0]["timestamp"].is_string());
}

#[tokio::test]
async fn test_chat_history_is_newest_first_across_requests() {
    let backend = Arc::new(ScriptedBackend::new());
    backend
        .push_reply("MODEL")
        .push_reply(LIBRARY_JSON)
        .push_reply("CONVO")
        .push_reply("It has two entities.");
    let app = make_app(backend);

    let resp = app
        .clone()
        .oneshot(chat_request(Some("alice"), "Create a library model"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(chat_request(Some("alice"), "How many entities?"))
        .await
        .unwrap();
    let body: ChatResponseBody = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(body.messages.len(), 4);
    assert_eq!(body.messages[0].content.as_text(), Some("How many entities?"));
    assert_eq!(body.messages[1].content.as_text(), Some("It has two entities."));
    assert_eq!(body.messages[2].content.as_text(), Some("Create a library model"));
    assert!(body.messages[3].content.as_model().is_some());

    let resp = app.oneshot(history_request(Some("alice"))).await.unwrap();
    let history: HistoryResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(history.messages, body.messages);
}

#[tokio::test]
async fn test_chat_empty_query_is_bad_request() {
    let backend = Arc::new(ScriptedBackend::new());
    let app = make_app(backend.clone());

    let resp = app.oneshot(chat_request(Some("alice"), "  ")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let err: ErrorBody = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(err.error, "bad_request");
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_chat_missing_query_field_is_rejected() {
    let app = make_app(Arc::new(ScriptedBackend::new()));
    let req = Request::post("/model-chat")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"question": "hi"}"#))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert!(resp.status().is_client_error());
    let err: ErrorBody = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert!(!err.error.is_empty());
    assert!(err.message.contains("query"));
}

#[tokio::test]
async fn test_chat_unparseable_body_returns_json_error() {
    let backend = Arc::new(ScriptedBackend::new());
    let app = make_app(backend.clone());
    let req = Request::post("/model-chat")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let err: ErrorBody = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(err.error, "bad_request");
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_chat_without_content_type_returns_json_error() {
    let app = make_app(Arc::new(ScriptedBackend::new()));
    let req = Request::post("/model-chat")
        .body(Body::from(r#"{"query": "hi"}"#))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let err: ErrorBody = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(err.error, "unsupported_media_type");
}

#[tokio::test]
async fn test_chat_upstream_failure_is_bad_gateway() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.push_failure("connection reset");
    let app = make_app(backend);

    let resp = app
        .clone()
        .oneshot(chat_request(Some("alice"), "hello"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let err: ErrorBody = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(err.error, "bad_gateway");
    assert!(!err.message.contains("connection reset"));

    let resp = app.oneshot(history_request(Some("alice"))).await.unwrap();
    let history: HistoryResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert!(history.messages.is_empty());
}

#[tokio::test]
async fn test_chat_malformed_model_is_bad_gateway() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.push_reply("MODEL").push_reply("I could not build that.");
    let app = make_app(backend);

    let resp = app
        .oneshot(chat_request(Some("alice"), "Create a model"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
}

// =============================================================================
// User identification
// =============================================================================

#[tokio::test]
async fn test_missing_user_header_uses_default_user() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.push_reply("CONVO").push_reply("hi");
    let app = make_app(backend);

    let resp = app.clone().oneshot(chat_request(None, "hello")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app.clone().oneshot(history_request(Some("default"))).await.unwrap();
    let history: HistoryResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(history.messages.len(), 2);

    let resp = app.oneshot(history_request(Some("someone-else"))).await.unwrap();
    let history: HistoryResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert!(history.messages.is_empty());
}

#[tokio::test]
async fn test_missing_user_header_rejected_when_required() {
    let mut config = LdmConfig::default();
    config.server.require_user_id = true;
    let backend = Arc::new(ScriptedBackend::new());
    let app = make_app_with(config, backend.clone());

    let resp = app.clone().oneshot(chat_request(None, "hello")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(backend.requests().is_empty());

    let resp = app.oneshot(history_request(None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_blank_user_header_rejected() {
    let app = make_app(Arc::new(ScriptedBackend::new()));
    let resp = app.oneshot(history_request(Some("   "))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Reset and history
// =============================================================================

#[tokio::test]
async fn test_reset_without_history_succeeds() {
    let app = make_app(Arc::new(ScriptedBackend::new()));
    let resp = app.oneshot(reset_request(Some("newcomer"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: ResetResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(body.user_id, "newcomer");
    assert!(!body.message.is_empty());
}

#[tokio::test]
async fn test_reset_clears_only_that_user_and_is_idempotent() {
    let backend = Arc::new(ScriptedBackend::new());
    backend
        .push_reply("CONVO")
        .push_reply("hi alice")
        .push_reply("CONVO")
        .push_reply("hi bob");
    let app = make_app(backend);

    app.clone().oneshot(chat_request(Some("alice"), "hello")).await.unwrap();
    app.clone().oneshot(chat_request(Some("bob"), "hello")).await.unwrap();

    for _ in 0..2 {
        let resp = app.clone().oneshot(reset_request(Some("alice"))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let resp = app.clone().oneshot(history_request(Some("alice"))).await.unwrap();
        let history: HistoryResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
        assert!(history.messages.is_empty());
    }

    let resp = app.oneshot(history_request(Some("bob"))).await.unwrap();
    let history: HistoryResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(history.messages.len(), 2);
}

#[tokio::test]
async fn test_unknown_users_are_not_remembered() {
    let app = make_app(Arc::new(ScriptedBackend::new()));

    for i in 0..100 {
        let user = format!("ghost-{i}");
        let resp = app.clone().oneshot(history_request(Some(&user))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let resp = app.clone().oneshot(reset_request(Some(&user))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let health: HealthResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(health.known_users, 0);
}

#[tokio::test]
async fn test_reset_forgets_user_in_health_count() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.push_reply("CONVO").push_reply("hi");
    let app = make_app(backend);

    app.clone().oneshot(chat_request(Some("alice"), "hello")).await.unwrap();
    app.clone().oneshot(reset_request(Some("alice"))).await.unwrap();

    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let health: HealthResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(health.known_users, 0);
}

#[tokio::test]
async fn test_history_empty_for_new_user() {
    let app = make_app(Arc::new(ScriptedBackend::new()));
    let resp = app.oneshot(history_request(Some("nobody"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(json["messages"], serde_json::json!([]));
}

// =============================================================================
// Middleware
// =============================================================================

#[tokio::test]
async fn test_rate_limit_rejects_excess_requests() {
    let mut config = LdmConfig::default();
    config.server.rate_limit_per_sec = 1;
    let app = make_app_with(config, Arc::new(ScriptedBackend::new()));

    let mut statuses = Vec::new();
    for _ in 0..3 {
        let resp = app.clone().oneshot(history_request(Some("alice"))).await.unwrap();
        statuses.push(resp.status());
    }
    assert!(statuses.contains(&StatusCode::TOO_MANY_REQUESTS));
}

#[tokio::test]
async fn test_health_is_not_rate_limited() {
    let mut config = LdmConfig::default();
    config.server.rate_limit_per_sec = 1;
    let app = make_app_with(config, Arc::new(ScriptedBackend::new()));

    for _ in 0..5 {
        let resp = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_cors_preflight_allows_configured_origin() {
    let mut config = LdmConfig::default();
    config.server.cors_origins = vec!["http://localhost:3000".to_string()];
    let app = make_app_with(config, Arc::new(ScriptedBackend::new()));

    let req = Request::builder()
        .method("OPTIONS")
        .uri("/model-chat")
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type,x-user-id")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:3000")
    );
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let mut config = LdmConfig::default();
    config.server.body_limit_bytes = 64;
    let app = make_app_with(config, Arc::new(ScriptedBackend::new()));

    let resp = app
        .oneshot(chat_request(Some("alice"), &"x".repeat(500)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let err: ErrorBody = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(err.error, "payload_too_large");
}
