//! Relay Core
//!
//! 接続ごとのプロトコル状態（`ConnectionSession`）に受信イベントを適用し、
//! 各ユースケースへ振り分けます。
//!
//! レジストリとキューにまたがる処理（登録 + フラッシュ、配送 or キューイング）は
//! `dispatch_lock` で直列化する。これにより、登録直後のフラッシュと同じ宛先への送信が
//! 追い越し合うことはない。通知タスクの実行はロックの外で行われる。

use std::{sync::Arc, time::Duration};

use tokio::sync::Mutex;

use crate::domain::{
    ConnectionHandle, ConnectionRegistry, ConnectionSession, InboundEvent, OfflineQueueRepository,
    OutboundFrame, OutboundReceiver, RejectionCode, UserId,
};

use super::{
    DeliveryOutcome, DisconnectUserUseCase, NotificationDispatcher, RegisterOutcome,
    RegisterUserUseCase, RelayError, SendMessageUseCase,
};

/// イベント処理の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Registered(RegisterOutcome),
    Sent(DeliveryOutcome),
}

pub struct RelayCore {
    register_user: RegisterUserUseCase,
    send_message: SendMessageUseCase,
    disconnect_user: DisconnectUserUseCase,
    dispatcher: Arc<NotificationDispatcher>,
    dispatch_lock: Mutex<()>,
}

impl RelayCore {
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        queue: Arc<dyn OfflineQueueRepository>,
        dispatcher: Arc<NotificationDispatcher>,
        flush_on_register: bool,
    ) -> Self {
        Self {
            register_user: RegisterUserUseCase::new(
                registry.clone(),
                queue.clone(),
                flush_on_register,
            ),
            send_message: SendMessageUseCase::new(registry.clone(), queue, dispatcher.clone()),
            disconnect_user: DisconnectUserUseCase::new(registry),
            dispatcher,
            dispatch_lock: Mutex::new(()),
        }
    }

    /// 新しい接続のセッションと、その書き出し用の受信側を作る
    pub fn open_session(&self) -> (ConnectionSession, OutboundReceiver) {
        let (handle, receiver) = ConnectionHandle::open();
        (ConnectionSession::new(handle), receiver)
    }

    pub fn dispatcher(&self) -> &Arc<NotificationDispatcher> {
        &self.dispatcher
    }

    /// 受信イベントを 1 件処理する
    pub async fn handle_event(
        &self,
        session: &mut ConnectionSession,
        event: InboundEvent,
    ) -> Result<EventOutcome, RelayError> {
        if session.is_closed() {
            return Err(RelayError::SessionClosed);
        }

        match event {
            InboundEvent::Register { user_id } => {
                let _guard = self.dispatch_lock.lock().await;
                let previous = session.mark_registered(user_id.clone());
                let outcome = self
                    .register_user
                    .execute(user_id.clone(), session.handle(), previous)
                    .await;
                tracing::info!(
                    "User '{}' registered on connection {}",
                    user_id,
                    session.connection_id()
                );
                Ok(EventOutcome::Registered(outcome))
            }
            InboundEvent::Message { recipient_id, text } => {
                let Some(sender_id) = session.user_id().cloned() else {
                    tracing::warn!(
                        "Message from unregistered connection {} rejected",
                        session.connection_id()
                    );
                    // 送信者側のチャンネルが閉じていても、ここで返すエラーは変わらない
                    let _ = session
                        .handle()
                        .send(OutboundFrame::Rejected(RejectionCode::NotRegistered));
                    return Err(RelayError::NotRegistered);
                };

                let _guard = self.dispatch_lock.lock().await;
                let outcome = self
                    .send_message
                    .execute(sender_id, recipient_id, text)
                    .await;
                Ok(EventOutcome::Sent(outcome))
            }
        }
    }

    /// 接続の終了を処理し、登録を解除した ID を返す
    ///
    /// 何度呼んでも 2 回目以降は何もしない。
    pub async fn handle_close(&self, session: &mut ConnectionSession) -> Option<UserId> {
        let user_id = session.mark_closed()?;
        let _guard = self.dispatch_lock.lock().await;
        self.disconnect_user
            .execute(&user_id, session.connection_id())
            .await
            .then_some(user_id)
    }

    /// 実行中の通知タスクを猶予期間だけ待ち、残りはキャンセルする
    pub async fn shutdown(&self, grace: Duration) {
        self.dispatcher.shutdown(grace).await;
    }
}
