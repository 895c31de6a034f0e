//! Firebase Cloud Messaging (HTTP v1) による NotificationGateway 実装
//!
//! `POST {endpoint}/v1/projects/{project_id}/messages:send`
//!
//! ```json
//! {"message": {"token": "...", "notification": {"title": "alice", "body": "hi"}}}
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    domain::{DeviceToken, NotificationError, NotificationGateway, NotificationSummary},
    infrastructure::google::GoogleTokenProvider,
};

pub const DEFAULT_FCM_ENDPOINT: &str = "https://fcm.googleapis.com";

/// FCM が「トークンが無効」と判断したときのエラーコード
const INVALID_TOKEN_ERROR_CODES: [&str; 2] = ["UNREGISTERED", "INVALID_ARGUMENT"];

#[derive(Debug, Serialize)]
struct FcmRequest<'a> {
    message: FcmMessage<'a>,
}

#[derive(Debug, Serialize)]
struct FcmMessage<'a> {
    token: &'a str,
    notification: FcmNotification<'a>,
}

#[derive(Debug, Serialize)]
struct FcmNotification<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Debug, Deserialize)]
struct FcmResponse {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FcmErrorEnvelope {
    error: FcmErrorBody,
}

#[derive(Debug, Deserialize)]
struct FcmErrorBody {
    status: Option<String>,
    #[serde(default)]
    details: Vec<FcmErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct FcmErrorDetail {
    #[serde(rename = "errorCode")]
    error_code: Option<String>,
}

/// FCM notification gateway
pub struct FcmNotificationGateway {
    project_id: String,
    endpoint: String,
    token_provider: Arc<GoogleTokenProvider>,
    http_client: reqwest::Client,
}

impl FcmNotificationGateway {
    pub fn new(
        project_id: String,
        token_provider: Arc<GoogleTokenProvider>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            project_id,
            endpoint: DEFAULT_FCM_ENDPOINT.to_string(),
            token_provider,
            http_client,
        }
    }

    /// 送信先のベース URL を差し替える
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    fn send_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/messages:send",
            self.endpoint, self.project_id
        )
    }
}

/// 応答本文から無効トークンかどうかを判定
fn is_invalid_token_error(body: &str) -> bool {
    let Ok(envelope) = serde_json::from_str::<FcmErrorEnvelope>(body) else {
        return false;
    };
    let mut codes = envelope
        .error
        .details
        .iter()
        .filter_map(|detail| detail.error_code.as_deref())
        .chain(envelope.error.status.as_deref());

    codes.any(|code| INVALID_TOKEN_ERROR_CODES.contains(&code))
}

#[async_trait]
impl NotificationGateway for FcmNotificationGateway {
    async fn send(
        &self,
        device_token: &DeviceToken,
        summary: &NotificationSummary,
    ) -> Result<(), NotificationError> {
        let access_token = self
            .token_provider
            .access_token()
            .await
            .map_err(|e| NotificationError::Auth(e.to_string()))?;

        let request = FcmRequest {
            message: FcmMessage {
                token: device_token.as_str(),
                notification: FcmNotification {
                    title: &summary.title,
                    body: &summary.body,
                },
            },
        };

        let response = self
            .http_client
            .post(self.send_url())
            .bearer_auth(access_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let body: FcmResponse = response
                .json()
                .await
                .map_err(|e| NotificationError::Transport(e.to_string()))?;
            tracing::debug!(
                "FCM accepted notification {}",
                body.name.as_deref().unwrap_or("<unnamed>")
            );
            return Ok(());
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        if is_invalid_token_error(&body) {
            return Err(NotificationError::InvalidToken);
        }
        Err(NotificationError::Api {
            status: status.as_u16(),
            body,
        })
    }
}
