//! UseCase: 切断処理

use std::sync::Arc;

use crate::domain::{ConnectionId, ConnectionRegistry, UserId};

/// 切断のユースケース
pub struct DisconnectUserUseCase {
    registry: Arc<dyn ConnectionRegistry>,
}

impl DisconnectUserUseCase {
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// 登録を解除する
    ///
    /// 同じ ID がすでに別の接続で登録し直されている場合は何もせず `false` を返す。
    /// キューに積まれたメッセージには触れない。
    pub async fn execute(&self, user_id: &UserId, connection_id: ConnectionId) -> bool {
        let removed = self.registry.unregister(user_id, connection_id).await;
        if removed {
            tracing::info!("User '{}' disconnected", user_id);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConnectionHandle, MockConnectionRegistry};

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_disconnect_unregisters_own_connection() {
        // テスト項目: 自分の接続 ID で登録解除を依頼する
        // given (前提条件):
        let (handle, _rx) = ConnectionHandle::open();
        let connection_id = handle.id();
        let mut registry = MockConnectionRegistry::new();
        registry
            .expect_unregister()
            .withf(move |user_id, id| user_id.as_str() == "alice" && *id == connection_id)
            .times(1)
            .returning(|_, _| true);
        let usecase = DisconnectUserUseCase::new(Arc::new(registry));

        // when (操作):
        let removed = usecase.execute(&user("alice"), connection_id).await;

        // then (期待する結果):
        assert!(removed);
    }

    #[tokio::test]
    async fn test_stale_disconnect_reports_not_removed() {
        // テスト項目: 別接続に取って代わられていた場合は false が返る
        // given (前提条件):
        let (handle, _rx) = ConnectionHandle::open();
        let mut registry = MockConnectionRegistry::new();
        registry
            .expect_unregister()
            .times(1)
            .returning(|_, _| false);
        let usecase = DisconnectUserUseCase::new(Arc::new(registry));

        // when (操作):
        let removed = usecase.execute(&user("alice"), handle.id()).await;

        // then (期待する結果):
        assert!(!removed);
    }
}
