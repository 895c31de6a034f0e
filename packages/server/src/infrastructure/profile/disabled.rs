use async_trait::async_trait;

use crate::domain::{DeviceToken, ProfileLookup, ProfileLookupError, UserId};

/// Lookup used when the profile store is not configured; no user has a token
#[derive(Debug, Default)]
pub struct DisabledProfileLookup;

#[async_trait]
impl ProfileLookup for DisabledProfileLookup {
    async fn get_token(&self, user_id: &UserId) -> Result<Option<DeviceToken>, ProfileLookupError> {
        tracing::debug!("Profile lookup disabled; no device token for '{}'", user_id);
        Ok(None)
    }
}
