//! UseCase: オフライン受信者へのプッシュ通知
//!
//! Profile Lookup → Notification Gateway の往復をバックグラウンドタスクとして実行します。
//!
//! - タスクは `TaskTracker` で追跡し、シャットダウン時に待機・キャンセルできる
//! - 1 回の往復はタイムアウトで打ち切る
//! - 結果（`NotificationOutcome`）はログに残すだけで、キューの状態には影響しない

use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use crate::domain::{ChatMessage, NotificationGateway, ProfileLookup, UserId};

/// 通知タスクの結末
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationOutcome {
    Sent,
    /// トークンが登録されていない（通知は送らない）
    NoToken,
    LookupFailed,
    GatewayFailed,
    TimedOut,
    Cancelled,
}

/// 通知タスクのディスパッチャ
pub struct NotificationDispatcher {
    profile_lookup: Arc<dyn ProfileLookup>,
    gateway: Arc<dyn NotificationGateway>,
    timeout: Duration,
    tracker: TaskTracker,
    cancel: CancellationToken,
}

impl NotificationDispatcher {
    pub fn new(
        profile_lookup: Arc<dyn ProfileLookup>,
        gateway: Arc<dyn NotificationGateway>,
        timeout: Duration,
    ) -> Self {
        Self {
            profile_lookup,
            gateway,
            timeout,
            tracker: TaskTracker::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// 通知タスクを起動する（呼び出し側は完了を待たない）
    pub fn dispatch(&self, recipient: UserId, message: ChatMessage) -> JoinHandle<NotificationOutcome> {
        let profile_lookup = self.profile_lookup.clone();
        let gateway = self.gateway.clone();
        let timeout = self.timeout;
        let cancel = self.cancel.clone();

        self.tracker.spawn(async move {
            let outcome = tokio::select! {
                _ = cancel.cancelled() => NotificationOutcome::Cancelled,
                result = tokio::time::timeout(
                    timeout,
                    notify(profile_lookup.as_ref(), gateway.as_ref(), &recipient, &message),
                ) => result.unwrap_or(NotificationOutcome::TimedOut),
            };

            match outcome {
                NotificationOutcome::Sent => {
                    tracing::info!("Notification sent to '{}'", recipient)
                }
                NotificationOutcome::NoToken => tracing::info!(
                    "No device token for '{}'; message stays queued without notification",
                    recipient
                ),
                NotificationOutcome::TimedOut => tracing::warn!(
                    "Notification to '{}' timed out after {:?}",
                    recipient,
                    timeout
                ),
                NotificationOutcome::Cancelled => {
                    tracing::warn!("Notification to '{}' cancelled by shutdown", recipient)
                }
                // 失敗の詳細は notify() 内でログ済み
                NotificationOutcome::LookupFailed | NotificationOutcome::GatewayFailed => {}
            }

            outcome
        })
    }

    /// 実行中の通知タスク数
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// その時点で走っているタスクがすべて終わるまで待つ
    pub async fn wait_idle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// 猶予期間だけ完了を待ち、残りはキャンセルする
    pub async fn shutdown(&self, grace: Duration) {
        self.tracker.close();
        let pending = self.tracker.len();
        if pending > 0 {
            tracing::info!(
                "Waiting up to {:?} for {} pending notification(s)",
                grace,
                pending
            );
        }

        if tokio::time::timeout(grace, self.tracker.wait()).await.is_err() {
            tracing::warn!(
                "Cancelling {} notification(s) still pending after {:?}",
                self.tracker.len(),
                grace
            );
            self.cancel.cancel();
            self.tracker.wait().await;
        }
    }
}

async fn notify(
    profile_lookup: &dyn ProfileLookup,
    gateway: &dyn NotificationGateway,
    recipient: &UserId,
    message: &ChatMessage,
) -> NotificationOutcome {
    let token = match profile_lookup.get_token(recipient).await {
        Ok(Some(token)) => token,
        Ok(None) => return NotificationOutcome::NoToken,
        Err(e) => {
            tracing::error!("Error getting device token for '{}': {}", recipient, e);
            return NotificationOutcome::LookupFailed;
        }
    };

    match gateway.send(&token, &message.summary()).await {
        Ok(()) => NotificationOutcome::Sent,
        Err(e) => {
            tracing::error!("Error sending notification to '{}': {}", recipient, e);
            NotificationOutcome::GatewayFailed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        DeviceToken, MessageText, MockNotificationGateway, MockProfileLookup, NotificationError,
        NotificationSummary, ProfileLookupError,
    };
    use async_trait::async_trait;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - Lookup → Gateway の呼び出し順と、トークンなし時のスキップ
    // - 協調者の失敗・タイムアウト・シャットダウン時のキャンセル
    //
    // 【なぜこのテストが必要か】
    // - 通知はベストエフォートだが、失敗がプロセスやキューに波及してはならない
    // ========================================

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    fn message(sender: &str, text: &str) -> ChatMessage {
        ChatMessage::new(user(sender), MessageText::new(text.to_string()).unwrap())
    }

    fn token(value: &str) -> DeviceToken {
        DeviceToken::new(value.to_string()).unwrap()
    }

    /// 応答を返さない Gateway
    struct HangingGateway;

    #[async_trait]
    impl NotificationGateway for HangingGateway {
        async fn send(
            &self,
            _device_token: &DeviceToken,
            _summary: &NotificationSummary,
        ) -> Result<(), NotificationError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_sends_notification_with_looked_up_token() {
        // テスト項目: Lookup で得たトークン宛てに、送信者をタイトル・本文をボディとして送る
        // given (前提条件):
        let mut lookup = MockProfileLookup::new();
        lookup
            .expect_get_token()
            .withf(|user_id| user_id.as_str() == "carol")
            .times(1)
            .returning(|_| Ok(Some(token("carol-device"))));
        let mut gateway = MockNotificationGateway::new();
        gateway
            .expect_send()
            .withf(|device_token, summary| {
                device_token.as_str() == "carol-device"
                    && summary.title == "alice"
                    && summary.body == "yo"
            })
            .times(1)
            .returning(|_, _| Ok(()));
        let dispatcher =
            NotificationDispatcher::new(Arc::new(lookup), Arc::new(gateway), Duration::from_secs(5));

        // when (操作):
        let outcome = dispatcher
            .dispatch(user("carol"), message("alice", "yo"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(outcome, NotificationOutcome::Sent);
    }

    #[tokio::test]
    async fn test_absent_token_skips_gateway() {
        // テスト項目: トークンが無い場合は Gateway を呼ばない
        // given (前提条件):
        let mut lookup = MockProfileLookup::new();
        lookup.expect_get_token().times(1).returning(|_| Ok(None));
        let mut gateway = MockNotificationGateway::new();
        gateway.expect_send().times(0);
        let dispatcher =
            NotificationDispatcher::new(Arc::new(lookup), Arc::new(gateway), Duration::from_secs(5));

        // when (操作):
        let outcome = dispatcher
            .dispatch(user("dave"), message("alice", "hello"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(outcome, NotificationOutcome::NoToken);
    }

    #[tokio::test]
    async fn test_lookup_failure_skips_gateway() {
        // テスト項目: Lookup の失敗は LookupFailed となり、Gateway は呼ばれない
        // given (前提条件):
        let mut lookup = MockProfileLookup::new();
        lookup
            .expect_get_token()
            .times(1)
            .returning(|_| Err(ProfileLookupError::Transport("connection refused".to_string())));
        let mut gateway = MockNotificationGateway::new();
        gateway.expect_send().times(0);
        let dispatcher =
            NotificationDispatcher::new(Arc::new(lookup), Arc::new(gateway), Duration::from_secs(5));

        // when (操作):
        let outcome = dispatcher
            .dispatch(user("dave"), message("alice", "hello"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(outcome, NotificationOutcome::LookupFailed);
    }

    #[tokio::test]
    async fn test_gateway_failure_is_contained() {
        // テスト項目: Gateway の失敗は GatewayFailed となり、タスクは正常終了する
        // given (前提条件):
        let mut lookup = MockProfileLookup::new();
        lookup
            .expect_get_token()
            .returning(|_| Ok(Some(token("stale-device"))));
        let mut gateway = MockNotificationGateway::new();
        gateway
            .expect_send()
            .times(1)
            .returning(|_, _| Err(NotificationError::InvalidToken));
        let dispatcher =
            NotificationDispatcher::new(Arc::new(lookup), Arc::new(gateway), Duration::from_secs(5));

        // when (操作):
        let outcome = dispatcher
            .dispatch(user("carol"), message("alice", "yo"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(outcome, NotificationOutcome::GatewayFailed);
    }

    #[tokio::test]
    async fn test_slow_gateway_times_out() {
        // テスト項目: 応答しない Gateway はタイムアウトで打ち切られる
        // given (前提条件):
        let mut lookup = MockProfileLookup::new();
        lookup
            .expect_get_token()
            .returning(|_| Ok(Some(token("carol-device"))));
        let dispatcher = NotificationDispatcher::new(
            Arc::new(lookup),
            Arc::new(HangingGateway),
            Duration::from_millis(50),
        );

        // when (操作):
        let outcome = dispatcher
            .dispatch(user("carol"), message("alice", "yo"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(outcome, NotificationOutcome::TimedOut);
        assert_eq!(dispatcher.pending(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_tasks_after_grace_period() {
        // テスト項目: シャットダウンの猶予を過ぎたタスクはキャンセルされる
        // given (前提条件):
        let mut lookup = MockProfileLookup::new();
        lookup
            .expect_get_token()
            .returning(|_| Ok(Some(token("carol-device"))));
        let dispatcher = NotificationDispatcher::new(
            Arc::new(lookup),
            Arc::new(HangingGateway),
            Duration::from_secs(3600),
        );
        let handle = dispatcher.dispatch(user("carol"), message("alice", "yo"));

        // when (操作):
        dispatcher.shutdown(Duration::from_millis(50)).await;

        // then (期待する結果):
        assert_eq!(handle.await.unwrap(), NotificationOutcome::Cancelled);
        assert_eq!(dispatcher.pending(), 0);
    }

    #[tokio::test]
    async fn test_wait_idle_waits_for_running_tasks() {
        // テスト項目: wait_idle は実行中のタスクの完了を待ち、その後も新しいタスクを受け付ける
        // given (前提条件):
        let mut lookup = MockProfileLookup::new();
        lookup.expect_get_token().times(2).returning(|_| Ok(None));
        let mut gateway = MockNotificationGateway::new();
        gateway.expect_send().times(0);
        let dispatcher =
            NotificationDispatcher::new(Arc::new(lookup), Arc::new(gateway), Duration::from_secs(5));
        dispatcher.dispatch(user("dave"), message("alice", "one"));

        // when (操作):
        dispatcher.wait_idle().await;
        dispatcher.dispatch(user("dave"), message("alice", "two"));
        dispatcher.wait_idle().await;

        // then (期待する結果):
        assert_eq!(dispatcher.pending(), 0);
    }
}
