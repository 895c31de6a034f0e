//! ドメイン層のエラー型

use thiserror::Error;

/// 値オブジェクトの検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("user id must not be empty")]
    UserIdEmpty,

    #[error("user id is too long ({actual} bytes, max {max})")]
    UserIdTooLong { max: usize, actual: usize },

    #[error("message text is too long ({actual} bytes, max {max})")]
    MessageTextTooLong { max: usize, actual: usize },

    #[error("device token must not be empty")]
    DeviceTokenEmpty,
}

/// 接続ハンドルへの送信エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushError {
    /// 相手のチャンネルがすでに閉じている
    #[error("connection '{0}' is closed")]
    ChannelClosed(String),
}

/// 通知ゲートウェイのエラー
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("failed to obtain access token: {0}")]
    Auth(String),

    #[error("notification request failed: {0}")]
    Transport(String),

    #[error("notification API error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("device token is invalid or unregistered")]
    InvalidToken,
}

/// プロフィール参照のエラー
#[derive(Debug, Error)]
pub enum ProfileLookupError {
    #[error("failed to obtain access token: {0}")]
    Auth(String),

    #[error("profile request failed: {0}")]
    Transport(String),

    #[error("profile API error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("malformed profile document: {0}")]
    MalformedDocument(String),
}
