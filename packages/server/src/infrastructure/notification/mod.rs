//! NotificationGateway 実装
//!
//! - `fcm`: Firebase Cloud Messaging HTTP v1 API
//! - `log_only`: 通知を送らずログに残すだけ（認証情報なしで起動した場合）

pub mod fcm;
pub mod log_only;

pub use fcm::FcmNotificationGateway;
pub use log_only::LogOnlyNotificationGateway;
