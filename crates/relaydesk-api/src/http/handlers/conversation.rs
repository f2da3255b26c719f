//! Read-only conversation endpoints for dashboards.
//!
//! `GET /api/v1/conversations` serves the live index snapshot (the same
//! data pushed over `chat:updated`); `GET /api/v1/conversations/{id}/messages`
//! reads the durable log, which survives eviction and restarts.

use std::time::Instant;

use axum::extract::{Path, State};
use axum::Json;

use relaydesk_core::store::ConversationStore;
use relaydesk_types::conversation::{ConversationSummary, Message};

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/conversations - Current index snapshot.
pub async fn list_conversations(
    State(state): State<AppState>,
) -> Json<ApiResponse<Vec<ConversationSummary>>> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let summaries = state.index.snapshot();

    let elapsed = start.elapsed().as_millis() as u64;
    Json(
        ApiResponse::success(summaries, request_id, elapsed)
            .with_link("self", "/api/v1/conversations"),
    )
}

/// GET /api/v1/conversations/{id}/messages - Durable message log.
///
/// 404 when the conversation has never been persisted.
pub async fn get_messages(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Message>>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let record = state
        .store
        .fetch(&conversation_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("conversation '{conversation_id}'")))?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(
        record.message_log,
        request_id,
        elapsed,
    )))
}
