//! Shared application state.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::usecase::{GetRelayStatsUseCase, RelayCore};

/// Shared application state
pub struct AppState {
    /// RelayCore（接続ごとのイベント処理）
    pub relay_core: Arc<RelayCore>,
    /// GetRelayStatsUseCase（運用向けの状態取得）
    pub get_relay_stats_usecase: Arc<GetRelayStatsUseCase>,
    /// サーバー停止時に WebSocket 接続を閉じるためのトークン
    pub shutdown: CancellationToken,
}
