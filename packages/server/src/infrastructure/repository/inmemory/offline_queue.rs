//! InMemory Offline Queue Repository 実装
//!
//! ドメイン層が定義する OfflineQueueRepository trait の具体的な実装。
//! 受信者ごとの `VecDeque` をインメモリ DB として使用します。
//!
//! 容量（`capacity`）を指定するとリングバッファとして振る舞い、
//! 満杯のバックログに追加すると最も古いメッセージが押し出されます。
//! 指定しない場合は無制限です。

use std::{
    collections::{HashMap, VecDeque},
    num::NonZeroUsize,
    sync::Arc,
};

use async_trait::async_trait;
use tayori_shared::time::{Clock, SystemClock};
use tokio::sync::Mutex;

use crate::domain::{
    ChatMessage, EnqueueOutcome, OfflineQueueRepository, QueuedMessage, Timestamp, UserId,
};

/// インメモリ オフラインキュー
pub struct InMemoryOfflineQueueRepository {
    backlogs: Mutex<HashMap<UserId, VecDeque<QueuedMessage>>>,
    /// 受信者ごとの最大件数（None = 無制限）
    capacity: Option<NonZeroUsize>,
    clock: Arc<dyn Clock>,
}

impl InMemoryOfflineQueueRepository {
    /// 新しい InMemoryOfflineQueueRepository を作成
    pub fn new(capacity: Option<NonZeroUsize>) -> Self {
        Self::with_clock(capacity, Arc::new(SystemClock))
    }

    /// 時計を差し替えて作成（テスト用）
    pub fn with_clock(capacity: Option<NonZeroUsize>, clock: Arc<dyn Clock>) -> Self {
        Self {
            backlogs: Mutex::new(HashMap::new()),
            capacity,
            clock,
        }
    }
}

#[async_trait]
impl OfflineQueueRepository for InMemoryOfflineQueueRepository {
    async fn enqueue(&self, recipient: &UserId, message: ChatMessage) -> EnqueueOutcome {
        let queued = QueuedMessage::new(message, Timestamp::new(self.clock.now_millis()));

        let mut backlogs = self.backlogs.lock().await;
        let backlog = backlogs.entry(recipient.clone()).or_default();

        let evicted = match self.capacity {
            Some(capacity) if backlog.len() >= capacity.get() => backlog.pop_front(),
            _ => None,
        };
        backlog.push_back(queued);

        if let Some(evicted) = &evicted {
            tracing::warn!(
                "Backlog for '{}' is full ({} messages); evicted oldest message from '{}'",
                recipient,
                backlog.len(),
                evicted.message.sender_id
            );
        }

        EnqueueOutcome {
            backlog_len: backlog.len(),
            evicted,
        }
    }

    async fn drain(&self, recipient: &UserId) -> Vec<QueuedMessage> {
        let mut backlogs = self.backlogs.lock().await;
        backlogs
            .remove(recipient)
            .map(Vec::from)
            .unwrap_or_default()
    }

    async fn restore(&self, recipient: &UserId, messages: Vec<QueuedMessage>) {
        if messages.is_empty() {
            return;
        }

        let mut backlogs = self.backlogs.lock().await;
        let backlog = backlogs.entry(recipient.clone()).or_default();
        for message in messages.into_iter().rev() {
            backlog.push_front(message);
        }

        // 戻した結果が容量を超えたら、新しい側ではなく古い側を落とす
        if let Some(capacity) = self.capacity {
            while backlog.len() > capacity.get() {
                backlog.pop_front();
            }
        }
    }

    async fn backlog(&self, recipient: &UserId) -> Vec<QueuedMessage> {
        let backlogs = self.backlogs.lock().await;
        backlogs
            .get(recipient)
            .map(|backlog| backlog.iter().cloned().collect())
            .unwrap_or_default()
    }

    async fn backlog_sizes(&self) -> Vec<(UserId, usize)> {
        let backlogs = self.backlogs.lock().await;
        let mut sizes: Vec<(UserId, usize)> = backlogs
            .iter()
            .filter(|(_, backlog)| !backlog.is_empty())
            .map(|(user_id, backlog)| (user_id.clone(), backlog.len()))
            .collect();
        sizes.sort_by(|a, b| a.0.cmp(&b.0));
        sizes
    }
}
