//! UseCase 層のエラー型

use thiserror::Error;

/// Relay Core がイベントを処理できなかった理由
///
/// いずれも接続やプロセスを落とす理由にはならない。UI 層がログに残して次のイベントへ進む。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// register 前の message（送信者には拒否フレームを返している）
    #[error("message received before registration")]
    NotRegistered,

    /// close 済みのセッションへのイベント
    #[error("connection is already closed")]
    SessionClosed,
}
