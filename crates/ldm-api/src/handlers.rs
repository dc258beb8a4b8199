//! Route handler functions for all API endpoints.
//!
//! Each handler resolves the caller's [`UserId`], calls the orchestrator,
//! and returns a JSON body. History is always returned in presentation
//! order, newest exchange first.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use ldm_core::types::{ChatTurn, Intent};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;
use crate::user::UserId;

// =============================================================================
// Request / response types
// =============================================================================

/// Request body for POST /model-chat.
#[derive(Debug, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The user's request or instruction for the modeling assistant.
    pub query: String,
}

/// Response body for POST /model-chat.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponseBody {
    /// How the query was routed.
    pub intent: Intent,
    /// Full ordered history after this exchange.
    pub messages: Vec<ChatTurn>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub messages: Vec<ChatTurn>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResetResponse {
    pub message: String,
    pub user_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub known_users: u64,
}

// =============================================================================
// Handler functions
// =============================================================================

/// POST /model-chat - classify the query and answer with text or a model.
pub async fn model_chat(
    State(state): State<AppState>,
    user: UserId,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<ChatResponseBody>, ApiError> {
    let Json(request) = body?;
    tracing::debug!(user_id = %user.as_str(), query_len = request.query.len(), "Chat request");

    let exchange = state
        .orchestrator
        .handle_message(user.as_str(), &request.query)
        .await?;

    Ok(Json(ChatResponseBody {
        intent: exchange.intent,
        messages: exchange.messages,
    }))
}

/// POST /model-chat/reset - clear the caller's history.
pub async fn reset_chat(
    State(state): State<AppState>,
    user: UserId,
) -> Result<Json<ResetResponse>, ApiError> {
    state.orchestrator.reset(user.as_str()).await?;
    Ok(Json(ResetResponse {
        message: "Chat history has been reset".to_string(),
        user_id: user.0,
    }))
}

/// GET /model-chat/history - the caller's ordered history.
pub async fn chat_history(
    State(state): State<AppState>,
    user: UserId,
) -> Result<Json<HistoryResponse>, ApiError> {
    let messages = state.orchestrator.history(user.as_str()).await?;
    Ok(Json(HistoryResponse { messages }))
}

/// GET /health - liveness and basic counters.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        known_users: state.orchestrator.history_store().known_users() as u64,
    })
}
