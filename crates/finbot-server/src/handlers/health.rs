//! Service info and health handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::AppState;
use finbot_core::AIBackend;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub financial_advisor: &'static str,
    /// `active`, `disabled` or `error`
    pub llm: &'static str,
    /// `active` or `error`
    pub database: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy` when the database answers, otherwise `degraded`
    pub status: &'static str,
    pub services: ServiceStatus,
    pub timestamp: String,
}

/// GET /health - Availability of each dependency
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let assistant = &state.assistant;

    let database = match assistant.db().ping() {
        Ok(()) => "active",
        Err(e) => {
            warn!(error = %e, "Database health check failed");
            "error"
        }
    };

    let llm = match assistant.ai() {
        None => "disabled",
        Some(client) if client.health_check().await => "active",
        Some(_) => "error",
    };

    Json(HealthResponse {
        status: if database == "active" { "healthy" } else { "degraded" },
        services: ServiceStatus {
            financial_advisor: "active",
            llm,
            database,
        },
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// GET / - Service description
pub async fn service_info() -> Json<Value> {
    Json(json!({
        "name": "FinBot",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Financial assistant chatbot for balances, spending, forecasts and fraud checks",
        "endpoints": {
            "POST /chat": "Send { message, userId? } and receive { success, response, model, timestamp }",
            "GET /health": "Service availability",
        }
    }))
}
