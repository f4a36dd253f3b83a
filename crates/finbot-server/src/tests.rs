//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use finbot_core::db::Database;
use finbot_core::test_utils::MockGeminiServer;
use finbot_core::{seed_demo_data, AIClient, AssistantConfig};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn seeded_assistant() -> FinancialAssistant {
    let db = Database::in_memory().unwrap();
    seed_demo_data(&db).unwrap();
    FinancialAssistant::new(db, AssistantConfig::default()).unwrap()
}

fn setup_test_app() -> Router {
    create_router(seeded_assistant(), ServerConfig::default())
}

async fn get_body_json(response: axum::response::Response) -> Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn chat_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/chat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn post_chat(app: Router, body: Value) -> (StatusCode, Value) {
    let response = app.oneshot(chat_request(&body.to_string())).await.unwrap();
    let status = response.status();
    (status, get_body_json(response).await)
}

// ========== Service Info / Health ==========

#[tokio::test]
async fn test_service_info() {
    let app = setup_test_app();

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["name"], "FinBot");
    assert!(json["endpoints"]["POST /chat"].is_string());
}

#[tokio::test]
async fn test_health_without_llm() {
    let app = setup_test_app();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["services"]["financialAdvisor"], "active");
    assert_eq!(json["services"]["llm"], "disabled");
    assert_eq!(json["services"]["database"], "active");
    assert!(json["timestamp"].is_string());
}

// ========== Chat ==========

#[tokio::test]
async fn test_chat_balance() {
    let (status, json) = post_chat(
        setup_test_app(),
        json!({ "message": "What's my balance?", "userId": 1 }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["model"], "financial-advisor");
    assert!(json["response"].as_str().unwrap().contains("15,250.75"));
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn test_chat_accepts_string_user_id_and_missing_user_id() {
    let (status, json) = post_chat(
        setup_test_app(),
        json!({ "message": "show my balance", "userId": "1" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);

    let (status, json) = post_chat(setup_test_app(), json!({ "message": "show my balance" })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["response"].as_str().unwrap().contains("15,250.75"));
}

#[tokio::test]
async fn test_chat_rejects_out_of_scope() {
    let (status, json) =
        post_chat(setup_test_app(), json!({ "message": "What's the weather today?" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["model"], "domain-filter");
}

#[tokio::test]
async fn test_chat_invalid_messages() {
    for body in [
        json!({}),
        json!({ "message": 42 }),
        json!({ "message": "   " }),
        json!({ "message": null, "userId": 1 }),
    ] {
        let (status, json) = post_chat(setup_test_app(), body.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
        assert_eq!(json["success"], false);
        assert!(json["error"].is_string());
    }
}

#[tokio::test]
async fn test_chat_malformed_json() {
    let response = setup_test_app()
        .oneshot(chat_request("{not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_chat_empty_database_is_internal_error() {
    let assistant =
        FinancialAssistant::new(Database::in_memory().unwrap(), AssistantConfig::default())
            .unwrap();
    let app = create_router(assistant, ServerConfig::default());

    let (status, json) = post_chat(app, json!({ "message": "What's my balance?" })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["success"], false);
    // Details stay in the logs
    assert_eq!(json["error"], "Internal server error");
}

// ========== LLM ==========

#[tokio::test]
async fn test_chat_uses_gemini_when_configured() {
    let server = MockGeminiServer::start().await;
    server.set_response("You are saving about 40% of your income.");
    let ai = AIClient::gemini(&server.url(), "gemini-test", "test-key").unwrap();
    let app = create_router(seeded_assistant().with_ai(Some(ai)), ServerConfig::default());

    let (status, json) = post_chat(
        app.clone(),
        json!({ "message": "How much am I saving?", "userId": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["model"], "gemini-test");
    assert_eq!(json["response"], "You are saving about 40% of your income.");

    let prompt = server.last_prompt().unwrap();
    assert!(prompt.contains("CUSTOMER FINANCIAL PROFILE:"));
    assert!(prompt.ends_with("User question: How much am I saving?"));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["services"]["llm"], "active");
}

#[tokio::test]
async fn test_chat_falls_back_when_gemini_fails() {
    let server = MockGeminiServer::start().await;
    server.fail_with_status(503);
    let ai = AIClient::gemini(&server.url(), "gemini-test", "test-key").unwrap();
    let app = create_router(seeded_assistant().with_ai(Some(ai)), ServerConfig::default());

    let (status, json) = post_chat(app.clone(), json!({ "message": "What's my balance?" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["model"], "financial-advisor");
    assert!(json["response"].as_str().unwrap().contains("15,250.75"));
    assert_eq!(server.request_count(), 1);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["services"]["llm"], "error");
}

// ========== CORS ==========

#[tokio::test]
async fn test_cors_allows_any_origin_by_default() {
    let response = setup_test_app()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("origin", "http://localhost:5173")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}
