//! ConnectionRegistry trait 定義
//!
//! ユーザー ID → 現在有効な接続ハンドルの対応表。
//! 1 つの ID に対して生きているハンドルは常に高々 1 つ。

use async_trait::async_trait;

use super::{ConnectionHandle, ConnectionId, UserId};

/// 接続レジストリ
///
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// ID にハンドルを結び付ける
    ///
    /// 既存の結び付けは上書きされ、上書きされたハンドルの ID を返す。
    /// 古いハンドルは閉じない。
    async fn register(&self, user_id: UserId, handle: ConnectionHandle) -> Option<ConnectionId>;

    /// ID に結び付いたハンドルを取得
    async fn lookup(&self, user_id: &UserId) -> Option<ConnectionHandle>;

    /// 結び付けを解除
    ///
    /// 現在のハンドルが `connection_id` のものである場合に限り削除し、削除したかどうかを返す。
    async fn unregister(&self, user_id: &UserId, connection_id: ConnectionId) -> bool;

    /// 接続中の全ユーザー ID（昇順）
    async fn connected_user_ids(&self) -> Vec<UserId>;

    /// 接続中のユーザー数
    async fn count(&self) -> usize;
}
