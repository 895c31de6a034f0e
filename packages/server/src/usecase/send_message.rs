//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - オンラインなら直接配送、オフラインならキューイング + 通知
//!
//! ### なぜこのテストが必要か
//! - 直接配送された場合は通知もキューイングも発生しないことを保証
//! - オフライン宛てはキューに残り、通知タスクが 1 回だけ起動されることを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：オンライン宛て、オフライン宛て
//! - 異常系：登録済みだがチャンネルが閉じている宛先
//! - エッジケース：自分宛て、容量超過による押し出し

use std::sync::Arc;

use crate::domain::{
    ChatMessage, ConnectionRegistry, MessageText, OfflineQueueRepository, OutboundFrame,
    QueuedMessage, UserId,
};

use super::NotificationDispatcher;

/// 送信結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// 受信者の接続へ直接書き出した
    Delivered,
    /// オフラインキューに積んだ（通知タスクを起動済み）
    Queued {
        backlog_len: usize,
        evicted: Option<QueuedMessage>,
    },
}

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    registry: Arc<dyn ConnectionRegistry>,
    queue: Arc<dyn OfflineQueueRepository>,
    dispatcher: Arc<NotificationDispatcher>,
}

impl SendMessageUseCase {
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        queue: Arc<dyn OfflineQueueRepository>,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            registry,
            queue,
            dispatcher,
        }
    }

    /// メッセージ送信を実行
    ///
    /// # Arguments
    ///
    /// * `sender_id` - 送信者（登録済みの ID）
    /// * `recipient_id` - 宛先
    /// * `text` - 本文
    pub async fn execute(
        &self,
        sender_id: UserId,
        recipient_id: UserId,
        text: MessageText,
    ) -> DeliveryOutcome {
        let message = ChatMessage::new(sender_id, text);

        if let Some(handle) = self.registry.lookup(&recipient_id).await {
            match handle.send(OutboundFrame::Deliver(message.clone())) {
                Ok(()) => {
                    tracing::debug!(
                        "Delivered message from '{}' to '{}'",
                        message.sender_id,
                        recipient_id
                    );
                    return DeliveryOutcome::Delivered;
                }
                Err(e) => {
                    tracing::warn!(
                        "Direct delivery to '{}' failed, queueing instead: {}",
                        recipient_id,
                        e
                    );
                }
            }
        }

        let outcome = self.queue.enqueue(&recipient_id, message.clone()).await;
        tracing::info!(
            "Queued message from '{}' for offline user '{}' (backlog: {})",
            message.sender_id,
            recipient_id,
            outcome.backlog_len
        );

        self.dispatcher.dispatch(recipient_id, message);

        DeliveryOutcome::Queued {
            backlog_len: outcome.backlog_len,
            evicted: outcome.evicted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            ConnectionHandle, DeviceToken, MockNotificationGateway, MockProfileLookup,
        },
        infrastructure::{
            connection_registry::InMemoryConnectionRegistry,
            repository::InMemoryOfflineQueueRepository,
        },
    };
    use std::{num::NonZeroUsize, time::Duration};

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    fn text(value: &str) -> MessageText {
        MessageText::new(value.to_string()).unwrap()
    }

    struct Fixture {
        usecase: SendMessageUseCase,
        registry: Arc<InMemoryConnectionRegistry>,
        queue: Arc<InMemoryOfflineQueueRepository>,
        dispatcher: Arc<NotificationDispatcher>,
    }

    fn create_fixture(
        lookup: MockProfileLookup,
        gateway: MockNotificationGateway,
        capacity: Option<NonZeroUsize>,
    ) -> Fixture {
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let queue = Arc::new(InMemoryOfflineQueueRepository::new(capacity));
        let dispatcher = Arc::new(NotificationDispatcher::new(
            Arc::new(lookup),
            Arc::new(gateway),
            Duration::from_secs(5),
        ));
        let usecase = SendMessageUseCase::new(registry.clone(), queue.clone(), dispatcher.clone());
        Fixture {
            usecase,
            registry,
            queue,
            dispatcher,
        }
    }

    fn no_notification() -> (MockProfileLookup, MockNotificationGateway) {
        let mut lookup = MockProfileLookup::new();
        lookup.expect_get_token().times(0);
        let mut gateway = MockNotificationGateway::new();
        gateway.expect_send().times(0);
        (lookup, gateway)
    }

    #[tokio::test]
    async fn test_online_recipient_receives_message_directly() {
        // テスト項目: オンライン宛てのメッセージは直接配送され、キュー・通知は発生しない
        // given (前提条件):
        let (lookup, gateway) = no_notification();
        let fixture = create_fixture(lookup, gateway, None);
        let (handle, mut rx) = ConnectionHandle::open();
        fixture.registry.register(user("bob"), handle).await;

        // when (操作):
        let outcome = fixture
            .usecase
            .execute(user("alice"), user("bob"), text("hi"))
            .await;

        // then (期待する結果):
        assert_eq!(outcome, DeliveryOutcome::Delivered);
        assert_eq!(
            rx.recv().await,
            Some(OutboundFrame::Deliver(ChatMessage::new(user("alice"), text("hi"))))
        );
        assert!(fixture.queue.backlog(&user("bob")).await.is_empty());
        fixture.dispatcher.wait_idle().await;
    }

    #[tokio::test]
    async fn test_offline_recipient_is_queued_and_notified() {
        // テスト項目: オフライン宛てはキューに積まれ、宛先のトークンで通知が 1 回送られる
        // given (前提条件):
        let mut lookup = MockProfileLookup::new();
        lookup
            .expect_get_token()
            .withf(|user_id| user_id.as_str() == "carol")
            .times(1)
            .returning(|_| Ok(Some(DeviceToken::new("carol-device".to_string()).unwrap())));
        let mut gateway = MockNotificationGateway::new();
        gateway
            .expect_send()
            .withf(|token, summary| {
                token.as_str() == "carol-device" && summary.title == "alice" && summary.body == "yo"
            })
            .times(1)
            .returning(|_, _| Ok(()));
        let fixture = create_fixture(lookup, gateway, None);

        // when (操作):
        let outcome = fixture
            .usecase
            .execute(user("alice"), user("carol"), text("yo"))
            .await;
        fixture.dispatcher.wait_idle().await;

        // then (期待する結果):
        assert_eq!(
            outcome,
            DeliveryOutcome::Queued {
                backlog_len: 1,
                evicted: None
            }
        );
        let backlog = fixture.queue.backlog(&user("carol")).await;
        assert_eq!(backlog.len(), 1);
        assert_eq!(backlog[0].message, ChatMessage::new(user("alice"), text("yo")));
    }

    #[tokio::test]
    async fn test_offline_recipient_without_token_is_queued_only() {
        // テスト項目: トークンの無いオフライン宛てはキューに積まれるだけで、Gateway は呼ばれない
        // given (前提条件):
        let mut lookup = MockProfileLookup::new();
        lookup.expect_get_token().times(1).returning(|_| Ok(None));
        let mut gateway = MockNotificationGateway::new();
        gateway.expect_send().times(0);
        let fixture = create_fixture(lookup, gateway, None);

        // when (操作):
        fixture
            .usecase
            .execute(user("alice"), user("dave"), text("hello"))
            .await;
        fixture.dispatcher.wait_idle().await;

        // then (期待する結果):
        assert_eq!(fixture.queue.backlog(&user("dave")).await.len(), 1);
    }

    #[tokio::test]
    async fn test_closed_channel_falls_back_to_queue() {
        // テスト項目: 登録済みでもチャンネルが閉じている宛先はキューに回される
        // given (前提条件):
        let mut lookup = MockProfileLookup::new();
        lookup.expect_get_token().times(1).returning(|_| Ok(None));
        let mut gateway = MockNotificationGateway::new();
        gateway.expect_send().times(0);
        let fixture = create_fixture(lookup, gateway, None);
        let (handle, rx) = ConnectionHandle::open();
        fixture.registry.register(user("bob"), handle).await;
        drop(rx);

        // when (操作):
        let outcome = fixture
            .usecase
            .execute(user("alice"), user("bob"), text("are you there?"))
            .await;
        fixture.dispatcher.wait_idle().await;

        // then (期待する結果):
        assert!(matches!(outcome, DeliveryOutcome::Queued { backlog_len: 1, .. }));
    }

    #[tokio::test]
    async fn test_message_to_self_is_delivered_to_own_connection() {
        // テスト項目: 自分宛てのメッセージも通常どおり自分の接続に配送される
        // given (前提条件):
        let (lookup, gateway) = no_notification();
        let fixture = create_fixture(lookup, gateway, None);
        let (handle, mut rx) = ConnectionHandle::open();
        fixture.registry.register(user("alice"), handle).await;

        // when (操作):
        let outcome = fixture
            .usecase
            .execute(user("alice"), user("alice"), text("note to self"))
            .await;

        // then (期待する結果):
        assert_eq!(outcome, DeliveryOutcome::Delivered);
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_full_queue_reports_evicted_message() {
        // テスト項目: 容量いっぱいのキューに積むと、最古のメッセージが押し出されて返される
        // given (前提条件):
        let mut lookup = MockProfileLookup::new();
        lookup.expect_get_token().times(2).returning(|_| Ok(None));
        let mut gateway = MockNotificationGateway::new();
        gateway.expect_send().times(0);
        let fixture = create_fixture(lookup, gateway, NonZeroUsize::new(1));
        fixture
            .usecase
            .execute(user("alice"), user("dave"), text("old"))
            .await;

        // when (操作):
        let outcome = fixture
            .usecase
            .execute(user("alice"), user("dave"), text("new"))
            .await;
        fixture.dispatcher.wait_idle().await;

        // then (期待する結果):
        match outcome {
            DeliveryOutcome::Queued {
                backlog_len,
                evicted: Some(evicted),
            } => {
                assert_eq!(backlog_len, 1);
                assert_eq!(evicted.message.text.as_str(), "old");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
