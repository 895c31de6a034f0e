//! エンティティ
//!
//! 配送・キューイングされるメッセージと、接続ハンドルを表現します。

use tokio::sync::mpsc;

use super::{
    error::PushError,
    value_object::{ConnectionId, MessageText, Timestamp, UserId},
};

/// 1 通のチャットメッセージ（送信者 + 本文）
///
/// 直接配送・キューイングのどちらでも同じ形で扱われ、生成後は変更されない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender_id: UserId,
    pub text: MessageText,
}

impl ChatMessage {
    pub fn new(sender_id: UserId, text: MessageText) -> Self {
        Self { sender_id, text }
    }

    /// プッシュ通知の要約（タイトル = 送信者、本文 = テキスト）
    pub fn summary(&self) -> NotificationSummary {
        NotificationSummary {
            title: self.sender_id.as_str().to_string(),
            body: self.text.as_str().to_string(),
        }
    }
}

/// 配送できずにキューに積まれたメッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedMessage {
    pub message: ChatMessage,
    pub queued_at: Timestamp,
}

impl QueuedMessage {
    pub fn new(message: ChatMessage, queued_at: Timestamp) -> Self {
        Self { message, queued_at }
    }
}

/// キューへの追加結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnqueueOutcome {
    /// 追加後のバックログ件数
    pub backlog_len: usize,
    /// 容量超過で押し出された最古のメッセージ
    pub evicted: Option<QueuedMessage>,
}

/// プッシュ通知の要約
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationSummary {
    pub title: String,
    pub body: String,
}

/// 送信者に返す拒否理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionCode {
    /// register 前に message を送った
    NotRegistered,
}

impl RejectionCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionCode::NotRegistered => "not_registered",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RejectionCode::NotRegistered => "register before sending messages",
        }
    }
}

/// 接続に書き出すフレーム
///
/// ワイヤ形式（JSON）への変換は Infrastructure 層の DTO が担う。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    Deliver(ChatMessage),
    Rejected(RejectionCode),
}

/// 接続の書き出しタスクが受け取る側
pub type OutboundReceiver = mpsc::UnboundedReceiver<OutboundFrame>;

/// 1 本の双方向チャンネルへの参照
///
/// 書き出しタスクが終了（= チャンネルが閉じた）すると送信は失敗する。
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    sender: mpsc::UnboundedSender<OutboundFrame>,
}

impl ConnectionHandle {
    /// 新しい接続ハンドルと、その書き出し用の受信側を作成
    pub fn open() -> (Self, OutboundReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = Self {
            id: ConnectionId::generate(),
            sender,
        };
        (handle, receiver)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// フレームを送信（ファイア・アンド・フォーゲット）
    ///
    /// 失敗した場合は送れなかったフレームを返さない。呼び出し側は元のメッセージを保持しておくこと。
    pub fn send(&self, frame: OutboundFrame) -> Result<(), PushError> {
        self.sender
            .send(frame)
            .map_err(|_| PushError::ChannelClosed(self.id.to_string()))
    }
}
