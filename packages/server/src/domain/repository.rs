//! Repository trait 定義
//!
//! 受信者ごとの未配送メッセージ（オフラインキュー）へのインターフェース。

use async_trait::async_trait;

use super::{ChatMessage, EnqueueOutcome, QueuedMessage, UserId};

/// Offline Queue Repository trait
///
/// キューは受信者ごとに FIFO 順を保つ。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OfflineQueueRepository: Send + Sync {
    /// 受信者のバックログ末尾にメッセージを追加（バックログがなければ作成）
    async fn enqueue(&self, recipient: &UserId, message: ChatMessage) -> EnqueueOutcome;

    /// 受信者のバックログをすべて取り出す（古い順）
    async fn drain(&self, recipient: &UserId) -> Vec<QueuedMessage>;

    /// 配送できなかったメッセージをバックログの先頭に戻す（順序は維持）
    async fn restore(&self, recipient: &UserId, messages: Vec<QueuedMessage>);

    /// 受信者のバックログを参照（取り出さない）
    async fn backlog(&self, recipient: &UserId) -> Vec<QueuedMessage>;

    /// 空でないバックログの件数一覧（ユーザー ID 昇順）
    async fn backlog_sizes(&self) -> Vec<(UserId, usize)>;
}
