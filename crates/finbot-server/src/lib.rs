//! FinBot Web Server
//!
//! Axum-based REST API for the FinBot financial assistant.
//!
//! Endpoints:
//! - `GET /` - service description
//! - `GET /health` - availability of the assistant, LLM and database
//! - `POST /chat` - answer one message
//!
//! There is no authentication or rate limiting; run it behind something that
//! provides them if it is reachable from outside.

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use finbot_core::{AIBackend, FinancialAssistant};

mod handlers;

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = any origin)
    pub allowed_origins: Vec<String>,
}

/// Shared application state
pub struct AppState {
    pub assistant: FinancialAssistant,
    pub config: ServerConfig,
}

/// Create the application router
pub fn create_router(assistant: FinancialAssistant, config: ServerConfig) -> Router {
    let cors = if config.allowed_origins.is_empty() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    };

    let state = Arc::new(AppState { assistant, config });

    Router::new()
        .route("/", get(handlers::service_info))
        .route("/health", get(handlers::health))
        .route("/chat", post(handlers::chat))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(tower_http::set_header::SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    assistant: FinancialAssistant,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    if config.allowed_origins.is_empty() {
        warn!("CORS allows any origin");
    }

    check_ai_connection(&assistant).await;

    let app = create_router(assistant, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log LLM backend connection status
async fn check_ai_connection(assistant: &FinancialAssistant) {
    match assistant.ai() {
        Some(client) => {
            if client.health_check().await {
                info!(host = %client.host(), model = %client.model(), "LLM backend connected");
            } else {
                warn!(
                    host = %client.host(),
                    model = %client.model(),
                    "LLM backend configured but not responding, answers will use local templates"
                );
            }
        }
        None => {
            info!("LLM backend not configured (set GEMINI_API_KEY to enable AI answers)");
        }
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// API error type; internal details are logged, never returned
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "success": false,
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "Internal server error".to_string(),
            // Keep full error for logging
            internal: Some(err.into()),
        }
    }
}

#[cfg(test)]
mod tests;
