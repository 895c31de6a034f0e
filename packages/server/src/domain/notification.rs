//! 外部協調者のインターフェース
//!
//! - `ProfileLookup`: ユーザー ID からデバイストークンを引く（外部ドキュメントストア）
//! - `NotificationGateway`: デバイストークン宛てにプッシュ通知を送る（外部通知サービス）

use async_trait::async_trait;

use super::{DeviceToken, NotificationError, NotificationSummary, ProfileLookupError, UserId};

/// プロフィール参照
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileLookup: Send + Sync {
    /// トークンが登録されていなければ `Ok(None)`
    async fn get_token(&self, user_id: &UserId) -> Result<Option<DeviceToken>, ProfileLookupError>;
}

/// 通知ゲートウェイ
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn send(
        &self,
        device_token: &DeviceToken,
        summary: &NotificationSummary,
    ) -> Result<(), NotificationError>;
}
