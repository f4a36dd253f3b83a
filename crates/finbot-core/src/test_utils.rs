//! Test utilities for finbot-core
//!
//! Provides a mock Gemini server that speaks just enough of the REST API
//! (`GET /v1beta/models/{model}` and `POST .../{model}:generateContent`) for
//! exercising the HTTP LLM path in tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::sync::oneshot;

#[derive(Default)]
struct MockState {
    response: String,
    error_status: Option<u16>,
    requests: usize,
    last_prompt: Option<String>,
}

type SharedState = Arc<Mutex<MockState>>;

/// Mock Gemini server for testing
pub struct MockGeminiServer {
    addr: SocketAddr,
    state: SharedState,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockGeminiServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let state: SharedState = Arc::new(Mutex::new(MockState {
            response: "Mock Gemini answer".to_string(),
            ..Default::default()
        }));

        let app = Router::new()
            .route("/v1beta/models/:model", get(handle_model).post(handle_generate))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Text returned by subsequent generate calls
    pub fn set_response(&self, text: &str) {
        let mut state = self.state.lock().unwrap();
        state.response = text.to_string();
        state.error_status = None;
    }

    /// Make every endpoint answer with an error status
    pub fn fail_with_status(&self, status: u16) {
        self.state.lock().unwrap().error_status = Some(status);
    }

    /// Number of generate calls received
    pub fn request_count(&self) -> usize {
        self.state.lock().unwrap().requests
    }

    /// Prompt text of the most recent generate call
    pub fn last_prompt(&self) -> Option<String> {
        self.state.lock().unwrap().last_prompt.clone()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockGeminiServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn error_response(status: u16) -> Response {
    let code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        code,
        Json(json!({ "error": { "code": status, "message": "mock failure" } })),
    )
        .into_response()
}

/// Model metadata endpoint (health check)
async fn handle_model(State(state): State<SharedState>, Path(model): Path<String>) -> Response {
    if let Some(status) = state.lock().unwrap().error_status {
        return error_response(status);
    }
    Json(json!({
        "name": format!("models/{}", model),
        "displayName": model,
        "supportedGenerationMethods": ["generateContent"],
    }))
    .into_response()
}

/// generateContent endpoint; the path segment is `{model}:generateContent`
async fn handle_generate(
    State(state): State<SharedState>,
    Path(model_action): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if !model_action.ends_with(":generateContent") {
        return StatusCode::NOT_FOUND.into_response();
    }

    let mut state = state.lock().unwrap();
    state.requests += 1;
    state.last_prompt = body["contents"][0]["parts"][0]["text"]
        .as_str()
        .map(str::to_string);
    if let Some(status) = state.error_status {
        return error_response(status);
    }

    Json(json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": state.response }] },
            "finishReason": "STOP",
        }]
    }))
    .into_response()
}
