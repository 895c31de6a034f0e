//! UseCase layer
//!
//! Relay Core のオーケストレーション。ドメイン層の trait だけに依存する。

mod disconnect_user;
mod error;
mod get_relay_stats;
mod notify_recipient;
mod register_user;
mod relay_core;
mod send_message;

pub use disconnect_user::DisconnectUserUseCase;
pub use error::RelayError;
pub use get_relay_stats::{GetRelayStatsUseCase, RelayStats};
pub use notify_recipient::{NotificationDispatcher, NotificationOutcome};
pub use register_user::{RegisterOutcome, RegisterUserUseCase};
pub use relay_core::{EventOutcome, RelayCore};
pub use send_message::{DeliveryOutcome, SendMessageUseCase};
