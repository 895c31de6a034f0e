//! インメモリ ConnectionRegistry 実装
//!
//! ## 責務
//!
//! - ユーザー ID と接続ハンドル（`ConnectionHandle`）の対応を管理
//! - 古い接続の close による誤削除を防ぐ（ConnectionId による持ち主判定）
//!
//! ## 設計ノート
//!
//! ハンドルの生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成されたハンドルを受け取り、ID で引けるようにするだけです。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionHandle, ConnectionId, ConnectionRegistry, UserId};

/// インメモリ接続レジストリ
#[derive(Default)]
pub struct InMemoryConnectionRegistry {
    /// Key: UserId, Value: 現在有効な接続ハンドル
    clients: Mutex<HashMap<UserId, ConnectionHandle>>,
}

impl InMemoryConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    async fn register(&self, user_id: UserId, handle: ConnectionHandle) -> Option<ConnectionId> {
        let connection_id = handle.id();
        let mut clients = self.clients.lock().await;
        let replaced = clients
            .insert(user_id.clone(), handle)
            .map(|previous| previous.id())
            .filter(|previous_id| *previous_id != connection_id);

        match replaced {
            Some(previous_id) => tracing::warn!(
                "User '{}' re-registered on connection {}; binding to {} was overwritten",
                user_id,
                connection_id,
                previous_id
            ),
            None => tracing::debug!(
                "User '{}' registered on connection {}",
                user_id,
                connection_id
            ),
        }

        replaced
    }

    async fn lookup(&self, user_id: &UserId) -> Option<ConnectionHandle> {
        let clients = self.clients.lock().await;
        // close イベント処理前でも、閉じたハンドルは不在として扱う
        clients
            .get(user_id)
            .filter(|handle| !handle.is_closed())
            .cloned()
    }

    async fn unregister(&self, user_id: &UserId, connection_id: ConnectionId) -> bool {
        let mut clients = self.clients.lock().await;
        match clients.get(user_id) {
            Some(handle) if handle.id() == connection_id => {
                clients.remove(user_id);
                tracing::debug!(
                    "User '{}' unregistered (connection {})",
                    user_id,
                    connection_id
                );
                true
            }
            Some(handle) => {
                tracing::debug!(
                    "Ignoring stale close for '{}': connection {} no longer owns the binding (current: {})",
                    user_id,
                    connection_id,
                    handle.id()
                );
                false
            }
            None => false,
        }
    }

    async fn connected_user_ids(&self) -> Vec<UserId> {
        let clients = self.clients.lock().await;
        let mut user_ids: Vec<UserId> = clients.keys().cloned().collect();
        user_ids.sort();
        user_ids
    }

    async fn count(&self) -> usize {
        self.clients.lock().await.len()
    }
}
