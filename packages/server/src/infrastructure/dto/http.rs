//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

/// `GET /api/health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthDto {
    pub status: String,
}

/// `GET /api/stats`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayStatsDto {
    pub connected_users: Vec<String>,
    pub backlogs: Vec<BacklogSizeDto>,
    pub pending_notifications: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacklogSizeDto {
    pub user_id: String,
    pub size: usize,
}

/// `GET /debug/queues/{user_id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedMessageDto {
    pub sender_id: String,
    pub text: String,
    /// RFC 3339 (UTC)
    pub queued_at: String,
}
