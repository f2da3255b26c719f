//! Dashboard statistics endpoint.
//!
//! GET /api/v1/stats - Live relay counts plus durable store totals.

use std::time::Instant;

use axum::extract::State;
use axum::Json;

use relaydesk_infra::sqlite::conversation::store_counts;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/stats - Aggregate dashboard statistics.
///
/// Store totals come from a single COUNT/SUM query; live counts come from
/// the transport, registry, and index directly.
pub async fn get_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let (total_conversations, total_messages) = store_counts(&state.db_pool).await?;

    let registry = state.coordinator.registry();
    let data = serde_json::json!({
        "total_conversations": total_conversations,
        "total_messages": total_messages,
        "active_conversations": state.index.len(),
        "connections": state.transport.connection_count(),
        "customer_sessions": registry.customer_count(),
        "agent_sessions": registry.agent_count(),
    });

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(data, request_id, elapsed)
        .with_link("self", "/api/v1/stats")
        .with_link("conversations", "/api/v1/conversations");

    Ok(Json(resp))
}
