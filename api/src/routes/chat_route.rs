//! POST /chat — one consultation turn.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Omit to start a new consultation.
    pub session_id: Option<Uuid>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub session_id: Uuid,
    pub reply: String,
}

/// Handler: POST /chat
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8080/chat \
///   -H 'content-type: application/json' \
///   -d '{"message":"I was born on 16 jan 2004 at 10:30 in Ahmedabad"}'
/// ```
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, String)> {
    if body.message.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "message must not be empty".into()));
    }

    let (session_id, consultation) = state.session(body.session_id).await;
    let reply = consultation.lock().await.handle_message(&body.message).await;

    Ok(Json(ChatResponse { session_id, reply }))
}
