use async_trait::async_trait;

use crate::domain::{DeviceToken, NotificationError, NotificationGateway, NotificationSummary};

/// Gateway used when push credentials are not configured
#[derive(Debug, Default)]
pub struct LogOnlyNotificationGateway;

#[async_trait]
impl NotificationGateway for LogOnlyNotificationGateway {
    async fn send(
        &self,
        device_token: &DeviceToken,
        summary: &NotificationSummary,
    ) -> Result<(), NotificationError> {
        tracing::info!(
            "Push notifications disabled; would notify {:?} with title '{}'",
            device_token,
            summary.title
        );
        Ok(())
    }
}
