//! WebSocket client session management.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use tayori_server::infrastructure::dto::websocket::{
    DeliveredMessage, ErrorMessage, InboundMessage,
};
use tayori_shared::time::get_timestamp_millis;

use crate::{
    error::ClientError,
    input::{InputCommand, parse_input},
};

use super::{formatter::MessageFormatter, ui::redisplay_prompt};

/// Display one text frame received from the relay
fn display_frame(text: &str, user_id: &str) {
    let formatted = if let Ok(delivered) = serde_json::from_str::<DeliveredMessage>(text) {
        MessageFormatter::format_delivered_message(
            &delivered.sender_id,
            &delivered.text,
            get_timestamp_millis(),
        )
    } else if let Ok(rejection) = serde_json::from_str::<ErrorMessage>(text) {
        MessageFormatter::format_rejection(&rejection.code, &rejection.message)
    } else {
        MessageFormatter::format_raw_message(text)
    };
    print!("{}", formatted);
    redisplay_prompt(user_id);
}

fn to_frame(message: &InboundMessage) -> Result<Message, ClientError> {
    let json = serde_json::to_string(message)
        .map_err(|e| ClientError::ConnectionError(format!("failed to serialize message: {e}")))?;
    Ok(Message::Text(json.into()))
}

/// Run one WebSocket session
///
/// 接続直後に register を送る（再接続時もサーバー側でキューがフラッシュされる）。
///
/// # Returns
///
/// * `Ok(())` - the user ended input (Ctrl+C / Ctrl+D)
/// * `Err(ClientError::ConnectionError)` - could not connect
/// * `Err(ClientError::ConnectionLost)` - the connection dropped
pub async fn run_client_session(
    url: &str,
    user_id: &str,
    input_rx: &mut mpsc::UnboundedReceiver<String>,
) -> Result<(), ClientError> {
    let (ws_stream, _response) = connect_async(url)
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

    tracing::info!("Connected to relay server!");

    let (mut write, mut read) = ws_stream.split();

    let register = to_frame(&InboundMessage::Register {
        user_id: user_id.to_string(),
    })?;
    write
        .send(register)
        .await
        .map_err(|e| ClientError::ConnectionLost(e.to_string()))?;

    println!(
        "\nYou are '{}'. Type `@recipient message` and press Enter to send. Press Ctrl+C to exit.\n",
        user_id
    );

    // Spawn a task to handle incoming messages
    let user_id_for_read = user_id.to_string();
    let mut read_task = tokio::spawn(async move {
        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => display_frame(text.as_str(), &user_id_for_read),
                Ok(Message::Binary(data)) => {
                    print!("{}", MessageFormatter::format_binary_message(data.len()));
                    redisplay_prompt(&user_id_for_read);
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Server closed the connection");
                    return "closed by server".to_string();
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    return e.to_string();
                }
                _ => {}
            }
        }
        "stream ended".to_string()
    });

    loop {
        tokio::select! {
            reason = &mut read_task => {
                let reason = reason.unwrap_or_else(|e| e.to_string());
                return Err(ClientError::ConnectionLost(reason));
            }
            line = input_rx.recv() => {
                let Some(line) = line else {
                    // 入力終了（Ctrl+C / Ctrl+D）
                    read_task.abort();
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(());
                };

                let (recipient_id, text) = match parse_input(&line) {
                    InputCommand::Send { recipient_id, text } => (recipient_id, text),
                    InputCommand::Invalid => {
                        print!("{}", MessageFormatter::format_usage());
                        redisplay_prompt(user_id);
                        continue;
                    }
                };

                let frame = to_frame(&InboundMessage::Message {
                    recipient_id: recipient_id.clone(),
                    text,
                })?;
                if let Err(e) = write.send(frame).await {
                    read_task.abort();
                    return Err(ClientError::ConnectionLost(e.to_string()));
                }

                print!(
                    "{}",
                    MessageFormatter::format_sent_confirmation(&recipient_id, get_timestamp_millis())
                );
                redisplay_prompt(user_id);
            }
        }
    }
}
