//! Server execution logic.

use std::{future::Future, sync::Arc, time::Duration};

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::usecase::{GetRelayStatsUseCase, RelayCore};

use super::{
    handler::{debug_queue, get_relay_stats, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Message relay server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(relay_core, get_relay_stats_usecase, Duration::from_secs(5));
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    /// RelayCore（接続ごとのイベント処理）
    relay_core: Arc<RelayCore>,
    /// GetRelayStatsUseCase（状態取得のユースケース）
    get_relay_stats_usecase: Arc<GetRelayStatsUseCase>,
    /// 停止時に通知タスクを待つ猶予
    shutdown_grace: Duration,
}

impl Server {
    pub fn new(
        relay_core: Arc<RelayCore>,
        get_relay_stats_usecase: Arc<GetRelayStatsUseCase>,
        shutdown_grace: Duration,
    ) -> Self {
        Self {
            relay_core,
            get_relay_stats_usecase,
            shutdown_grace,
        }
    }

    fn router(&self, shutdown: CancellationToken) -> Router {
        let app_state = Arc::new(AppState {
            relay_core: self.relay_core.clone(),
            get_relay_stats_usecase: self.get_relay_stats_usecase.clone(),
            shutdown,
        });

        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/stats", get(get_relay_stats))
            .route("/debug/queues/{user_id}", get(debug_queue))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state)
    }

    /// Run the relay server until Ctrl+C / SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> std::io::Result<()> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Message relay listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    ///
    /// 停止時は WebSocket 接続を閉じ、実行中の通知タスクを猶予期間だけ待つ。
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let shutdown_token = CancellationToken::new();
        let app = self.router(shutdown_token.clone());

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.await;
                tracing::info!("Shutting down: closing WebSocket connections");
                shutdown_token.cancel();
            })
            .await?;

        self.relay_core.shutdown(self.shutdown_grace).await;
        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
