//! UseCase: ユーザー登録処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - RegisterUserUseCase::execute() メソッド
//! - 接続の登録、旧 ID の解放、オフラインキューのフラッシュ
//!
//! ### なぜこのテストが必要か
//! - 登録後のメッセージが直接配送されるための前提となる
//! - フラッシュの順序（古い順）と、失敗時にキューへ戻すことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：初回登録、バックログのフラッシュ
//! - 異常系：フラッシュ中にチャンネルが閉じる
//! - エッジケース：同じ接続で別 ID を名乗り直す、フラッシュ無効

use std::sync::Arc;

use crate::domain::{
    ConnectionHandle, ConnectionId, ConnectionRegistry, OfflineQueueRepository, OutboundFrame,
    UserId,
};

/// 登録処理の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterOutcome {
    /// 上書きされた別接続の ID
    pub replaced: Option<ConnectionId>,
    /// フラッシュで配送したバックログ件数
    pub flushed: usize,
    /// 配送できずにキューへ戻した件数
    pub restored: usize,
}

/// ユーザー登録のユースケース
pub struct RegisterUserUseCase {
    registry: Arc<dyn ConnectionRegistry>,
    queue: Arc<dyn OfflineQueueRepository>,
    /// 登録時にバックログを配送するか
    flush_on_register: bool,
}

impl RegisterUserUseCase {
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        queue: Arc<dyn OfflineQueueRepository>,
        flush_on_register: bool,
    ) -> Self {
        Self {
            registry,
            queue,
            flush_on_register,
        }
    }

    /// 登録を実行
    ///
    /// # Arguments
    ///
    /// * `user_id` - 名乗る ID
    /// * `handle` - この接続のハンドル
    /// * `previous` - 同じ接続が直前に名乗っていた ID（あれば自分の登録に限って解放する）
    pub async fn execute(
        &self,
        user_id: UserId,
        handle: &ConnectionHandle,
        previous: Option<UserId>,
    ) -> RegisterOutcome {
        if let Some(previous) = previous.filter(|previous| previous != &user_id) {
            self.registry.unregister(&previous, handle.id()).await;
        }

        let replaced = self.registry.register(user_id.clone(), handle.clone()).await;

        let (flushed, restored) = if self.flush_on_register {
            self.flush_backlog(&user_id, handle).await
        } else {
            (0, 0)
        };

        RegisterOutcome {
            replaced,
            flushed,
            restored,
        }
    }

    /// バックログを古い順に配送し、送れなかった分はキューの先頭へ戻す
    async fn flush_backlog(&self, user_id: &UserId, handle: &ConnectionHandle) -> (usize, usize) {
        let mut backlog = self.queue.drain(user_id).await.into_iter();
        let mut flushed = 0;

        while let Some(queued) = backlog.next() {
            if let Err(e) = handle.send(OutboundFrame::Deliver(queued.message.clone())) {
                tracing::warn!("Backlog flush for '{}' interrupted: {}", user_id, e);
                let remaining: Vec<_> = std::iter::once(queued).chain(backlog).collect();
                let restored = remaining.len();
                self.queue.restore(user_id, remaining).await;
                return (flushed, restored);
            }
            flushed += 1;
        }

        if flushed > 0 {
            tracing::info!("Flushed {} queued message(s) to '{}'", flushed, user_id);
        }
        (flushed, 0)
    }
}
