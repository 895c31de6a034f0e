//! UseCase: リレーの状態取得（運用向け）

use std::sync::Arc;

use crate::domain::{ConnectionRegistry, OfflineQueueRepository, QueuedMessage, UserId};

use super::NotificationDispatcher;

/// リレーのスナップショット
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayStats {
    /// 登録中のユーザー（ソート済み）
    pub connected_users: Vec<UserId>,
    /// 空でないバックログの件数（ユーザー ID 順）
    pub backlogs: Vec<(UserId, usize)>,
    /// 実行中の通知タスク数
    pub pending_notifications: usize,
}

/// 状態取得のユースケース
pub struct GetRelayStatsUseCase {
    registry: Arc<dyn ConnectionRegistry>,
    queue: Arc<dyn OfflineQueueRepository>,
    dispatcher: Arc<NotificationDispatcher>,
}

impl GetRelayStatsUseCase {
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        queue: Arc<dyn OfflineQueueRepository>,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            registry,
            queue,
            dispatcher,
        }
    }

    pub async fn execute(&self) -> RelayStats {
        RelayStats {
            connected_users: self.registry.connected_user_ids().await,
            backlogs: self.queue.backlog_sizes().await,
            pending_notifications: self.dispatcher.pending(),
        }
    }

    /// 指定ユーザーのバックログを（取り出さずに）参照する
    pub async fn backlog_of(&self, user_id: &UserId) -> Vec<QueuedMessage> {
        self.queue.backlog(user_id).await
    }
}
