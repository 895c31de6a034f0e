//! Domain layer
//!
//! リレーの中核となる値オブジェクト・エンティティと、
//! 外部協調者（接続レジストリ、オフラインキュー、プッシュ通知、プロフィール参照）の
//! インターフェース（trait）を定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

pub mod connection_registry;
pub mod entity;
pub mod error;
pub mod notification;
pub mod repository;
pub mod session;
pub mod value_object;

pub use connection_registry::ConnectionRegistry;
pub use entity::{
    ChatMessage, ConnectionHandle, EnqueueOutcome, NotificationSummary, OutboundFrame,
    OutboundReceiver, QueuedMessage, RejectionCode,
};
pub use error::{NotificationError, ProfileLookupError, PushError, ValueObjectError};
pub use notification::{NotificationGateway, ProfileLookup};
pub use repository::OfflineQueueRepository;
pub use session::{ConnectionSession, ConnectionState, InboundEvent};
pub use value_object::{ConnectionId, DeviceToken, MessageText, Timestamp, UserId};

#[cfg(test)]
pub use connection_registry::MockConnectionRegistry;
#[cfg(test)]
pub use notification::{MockNotificationGateway, MockProfileLookup};
#[cfg(test)]
pub use repository::MockOfflineQueueRepository;
