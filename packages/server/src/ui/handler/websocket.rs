//! WebSocket connection handlers.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};

use crate::{
    domain::{ConnectionSession, OutboundReceiver},
    infrastructure::dto::{decode_inbound, encode_outbound},
    ui::state::AppState,
    usecase::{DeliveryOutcome, EventOutcome, RelayCore},
};

/// ライターが Close フレームを送り終えるまで待つ上限
const WRITER_CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that drains the connection's outbound frames into the WebSocket sender.
///
/// フレームは受け取った順に書き出す。送信に失敗したら（= 相手が切断）終了する。
fn pusher_loop(
    mut rx: OutboundReceiver,
    mut sender: SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let json = match encode_outbound(frame) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to encode outbound frame: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, mut receiver) = socket.split();
    let (mut session, rx) = state.relay_core.open_session();
    let connection_id = session.connection_id();
    tracing::info!("Connection {} opened", connection_id);

    let mut send_task = pusher_loop(rx, sender);
    let mut writer_stopped = false;

    // 1 件ずつ最後まで処理する（処理途中では中断しない）
    loop {
        let msg = tokio::select! {
            msg = receiver.next() => msg,
            _ = &mut send_task => {
                tracing::debug!("Writer for connection {} stopped", connection_id);
                writer_stopped = true;
                break;
            }
            _ = state.shutdown.cancelled() => break,
        };

        let msg = match msg {
            Some(Ok(msg)) => msg,
            Some(Err(e)) => {
                tracing::warn!("WebSocket error on connection {}: {}", connection_id, e);
                break;
            }
            None => break,
        };

        match msg {
            Message::Text(text) => {
                process_text(&state.relay_core, &mut session, text.as_str()).await;
            }
            Message::Binary(_) => {
                tracing::warn!(
                    "Ignoring binary frame on connection {}",
                    connection_id
                );
            }
            Message::Close(_) => {
                tracing::info!("Connection {} requested close", connection_id);
                break;
            }
            // Ping/pong is handled automatically by the WebSocket protocol
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }

    if let Some(user_id) = state.relay_core.handle_close(&mut session).await {
        tracing::info!("User '{}' went offline", user_id);
    }

    // 最後の送信側を手放すとライターは Close フレームを送って終了する
    drop(session);
    if !writer_stopped {
        let abort = send_task.abort_handle();
        if tokio::time::timeout(WRITER_CLOSE_TIMEOUT, send_task)
            .await
            .is_err()
        {
            tracing::warn!(
                "Writer for connection {} did not finish closing; aborting",
                connection_id
            );
            abort.abort();
        }
    }
    tracing::info!("Connection {} closed", connection_id);
}

/// Decode one text frame and hand it to the relay core.
///
/// 不正なペイロードはログに残して捨てる（応答フレームは返さない）。
async fn process_text(relay_core: &RelayCore, session: &mut ConnectionSession, text: &str) {
    let event = match decode_inbound(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(
                "Dropping malformed payload on connection {}: {}",
                session.connection_id(),
                e
            );
            return;
        }
    };

    match relay_core.handle_event(session, event).await {
        Ok(EventOutcome::Registered(outcome)) => {
            if let Some(replaced) = outcome.replaced {
                tracing::info!(
                    "Connection {} took over from connection {}",
                    session.connection_id(),
                    replaced
                );
            }
        }
        Ok(EventOutcome::Sent(DeliveryOutcome::Delivered)) => {}
        Ok(EventOutcome::Sent(DeliveryOutcome::Queued { evicted, .. })) => {
            if let Some(evicted) = evicted {
                tracing::debug!(
                    "Oldest queued message from '{}' was dropped",
                    evicted.message.sender_id
                );
            }
        }
        Err(e) => {
            tracing::warn!(
                "Event on connection {} not processed: {}",
                session.connection_id(),
                e
            );
        }
    }
}
