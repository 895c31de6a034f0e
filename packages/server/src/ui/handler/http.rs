//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::UserId,
    infrastructure::dto::http::{BacklogSizeDto, HealthDto, QueuedMessageDto, RelayStatsDto},
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok".to_string(),
    })
}

/// Relay statistics (connected users, backlog sizes, pending notifications)
pub async fn get_relay_stats(State(state): State<Arc<AppState>>) -> Json<RelayStatsDto> {
    let stats = state.get_relay_stats_usecase.execute().await;

    // Domain Model から DTO への変換
    Json(RelayStatsDto {
        connected_users: stats
            .connected_users
            .into_iter()
            .map(UserId::into_string)
            .collect(),
        backlogs: stats
            .backlogs
            .into_iter()
            .map(|(user_id, size)| BacklogSizeDto {
                user_id: user_id.into_string(),
                size,
            })
            .collect(),
        pending_notifications: stats.pending_notifications,
    })
}

/// Debug endpoint to peek at one recipient's queued messages
pub async fn debug_queue(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<QueuedMessageDto>>, StatusCode> {
    let user_id = match UserId::new(user_id) {
        Ok(user_id) => user_id,
        Err(e) => {
            tracing::warn!("Invalid user ID in queue lookup: {}", e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    let backlog = state.get_relay_stats_usecase.backlog_of(&user_id).await;
    Ok(Json(backlog.into_iter().map(QueuedMessageDto::from).collect()))
}
