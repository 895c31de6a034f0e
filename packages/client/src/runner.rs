//! Client execution logic with reconnection support.

use std::time::Duration;

use tayori_server::domain::UserId;

use super::{
    domain::{reconnects_used, should_attempt_reconnect, should_exit_immediately},
    error::ClientError,
    session::run_client_session,
    ui::spawn_line_reader,
};

const MAX_RECONNECT_ATTEMPTS: u32 = 5;
const RECONNECT_INTERVAL_SECS: u64 = 5;

/// Run the relay client with reconnection logic
pub async fn run_client(url: String, user_id: String) -> Result<(), ClientError> {
    // サーバーと同じ規則で事前に検証する
    if let Err(e) = UserId::new(user_id.clone()) {
        return Err(ClientError::InvalidUserId(user_id, e.to_string()));
    }

    let mut input_rx = spawn_line_reader(&user_id);
    let mut reconnects = 0;

    loop {
        tracing::info!("Attempting to connect to {} as '{}'", url, user_id);

        let error = match run_client_session(&url, &user_id, &mut input_rx).await {
            Ok(()) => {
                // If the user ended the session, don't reconnect
                tracing::info!("Client session ended normally");
                return Ok(());
            }
            Err(e) => e,
        };

        tracing::warn!("{}", error);
        if should_exit_immediately(&error) {
            return Err(error);
        }

        reconnects = reconnects_used(&error, reconnects);
        if !should_attempt_reconnect(&error, reconnects, MAX_RECONNECT_ATTEMPTS) {
            return Err(ClientError::ReconnectExhausted(MAX_RECONNECT_ATTEMPTS));
        }
        reconnects += 1;

        tracing::info!(
            "Reconnecting in {} seconds... (attempt {}/{})",
            RECONNECT_INTERVAL_SECS,
            reconnects,
            MAX_RECONNECT_ATTEMPTS
        );

        tokio::time::sleep(Duration::from_secs(RECONNECT_INTERVAL_SECS)).await;
    }
}
