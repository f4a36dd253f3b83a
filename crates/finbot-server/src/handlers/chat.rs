//! Chat handler

use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::{AppError, AppState};
use finbot_core::Error;

/// Response body for POST /chat
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub success: bool,
    pub response: String,
    pub model: String,
    /// RFC 3339
    pub timestamp: String,
}

/// `userId` may be sent as a number or a numeric string
fn parse_user_id(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// POST /chat - Answer one message
///
/// Body: `{ "message": "...", "userId": 1 }`. Without a (known) `userId`
/// the first customer in the database is used.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(body) = payload.map_err(|e| {
        debug!(error = %e, "Rejected chat body");
        AppError::bad_request("Request body must be a JSON object")
    })?;

    let message = match body.get("message") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.as_str(),
        _ => {
            return Err(AppError::bad_request(
                "Message is required and must be a non-empty string",
            ))
        }
    };

    let assistant = &state.assistant;
    let customer_id = assistant.resolve_customer(parse_user_id(body.get("userId")))?;

    let reply = match assistant.respond(customer_id, message).await {
        Ok(reply) => reply,
        Err(Error::InvalidInput(msg)) => return Err(AppError::bad_request(&msg)),
        Err(e) => return Err(e.into()),
    };

    Ok(Json(ChatResponse {
        success: true,
        response: reply.text,
        model: reply.model,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_user_id() {
        assert_eq!(parse_user_id(Some(&json!(42))), Some(42));
        assert_eq!(parse_user_id(Some(&json!(" 7 "))), Some(7));
        assert_eq!(parse_user_id(Some(&json!("abc"))), None);
        assert_eq!(parse_user_id(Some(&json!(1.5))), None);
        assert_eq!(parse_user_id(Some(&json!(null))), None);
        assert_eq!(parse_user_id(None), None);
    }
}
