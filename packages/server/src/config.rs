//! Server configuration
//!
//! コマンドライン引数と環境変数（`clap` の `env` フォールバック）から `ServerConfig` を組み立てる。

use std::{num::NonZeroUsize, path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use thiserror::Error;

use crate::{
    domain::{NotificationGateway, ProfileLookup},
    infrastructure::{
        google::{GoogleAuthError, GoogleTokenProvider, ServiceAccountKey},
        notification::{FcmNotificationGateway, LogOnlyNotificationGateway},
        profile::{DisabledProfileLookup, FirestoreProfileLookup},
    },
};

#[derive(Parser, Debug, Clone)]
#[command(name = "tayori-server")]
#[command(about = "Presence-aware message relay with offline queueing and push notifications", long_about = None)]
pub struct ServerArgs {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "TAYORI_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "TAYORI_PORT", default_value = "8080")]
    pub port: u16,

    /// Maximum queued messages per offline recipient (oldest are dropped first). Unbounded if omitted
    #[arg(long, env = "TAYORI_QUEUE_CAPACITY")]
    pub queue_capacity: Option<usize>,

    /// Timeout for one profile lookup + push round trip, in seconds
    #[arg(long, env = "TAYORI_NOTIFICATION_TIMEOUT_SECS", default_value = "10")]
    pub notification_timeout_secs: u64,

    /// How long shutdown waits for pending notifications, in seconds
    #[arg(long, env = "TAYORI_SHUTDOWN_GRACE_SECS", default_value = "5")]
    pub shutdown_grace_secs: u64,

    /// Keep queued messages when a recipient registers instead of delivering them
    #[arg(long, env = "TAYORI_NO_FLUSH_ON_REGISTER")]
    pub no_flush_on_register: bool,

    /// Service account JSON used for Firestore and FCM. Push notifications are disabled if omitted
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    pub credentials: Option<PathBuf>,

    /// Firebase project ID (defaults to the service account's project)
    #[arg(long, env = "TAYORI_FIREBASE_PROJECT_ID")]
    pub firebase_project_id: Option<String>,

    /// Override the FCM base URL
    #[arg(long, env = "TAYORI_FCM_ENDPOINT")]
    pub fcm_endpoint: Option<String>,

    /// Override the Firestore base URL
    #[arg(long, env = "TAYORI_FIRESTORE_ENDPOINT")]
    pub firestore_endpoint: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("queue capacity must be greater than zero")]
    ZeroQueueCapacity,

    #[error("notification timeout must be greater than zero")]
    ZeroNotificationTimeout,

    #[error("failed to load service account: {0}")]
    Credentials(#[from] GoogleAuthError),

    #[error("firebase project ID is empty")]
    EmptyProjectId,
}

/// Push notification settings (present only when a service account is configured)
#[derive(Debug, Clone)]
pub struct PushConfig {
    pub service_account: ServiceAccountKey,
    pub project_id: String,
    pub fcm_endpoint: Option<String>,
    pub firestore_endpoint: Option<String>,
}

/// Validated server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub queue_capacity: Option<NonZeroUsize>,
    pub notification_timeout: Duration,
    pub shutdown_grace: Duration,
    pub flush_on_register: bool,
    pub push: Option<PushConfig>,
}

impl ServerConfig {
    pub fn from_args(args: ServerArgs) -> Result<Self, ConfigError> {
        let queue_capacity = match args.queue_capacity {
            Some(capacity) => Some(NonZeroUsize::new(capacity).ok_or(ConfigError::ZeroQueueCapacity)?),
            None => None,
        };

        if args.notification_timeout_secs == 0 {
            return Err(ConfigError::ZeroNotificationTimeout);
        }

        let push = match args.credentials {
            Some(path) => {
                let service_account = ServiceAccountKey::from_file(&path)?;
                let project_id = args
                    .firebase_project_id
                    .unwrap_or_else(|| service_account.project_id.clone());
                if project_id.trim().is_empty() {
                    return Err(ConfigError::EmptyProjectId);
                }
                Some(PushConfig {
                    service_account,
                    project_id,
                    fcm_endpoint: args.fcm_endpoint,
                    firestore_endpoint: args.firestore_endpoint,
                })
            }
            None => None,
        };

        Ok(Self {
            host: args.host,
            port: args.port,
            queue_capacity,
            notification_timeout: Duration::from_secs(args.notification_timeout_secs),
            shutdown_grace: Duration::from_secs(args.shutdown_grace_secs),
            flush_on_register: !args.no_flush_on_register,
            push,
        })
    }

    /// Build the profile lookup and notification gateway for this configuration
    ///
    /// Without a service account the relay still queues messages, but never finds a token.
    pub fn notification_collaborators(&self) -> (Arc<dyn ProfileLookup>, Arc<dyn NotificationGateway>) {
        let Some(push) = &self.push else {
            tracing::warn!("No service account configured; push notifications are disabled");
            return (
                Arc::new(DisabledProfileLookup),
                Arc::new(LogOnlyNotificationGateway),
            );
        };

        let http_client = reqwest::Client::new();
        let token_provider = Arc::new(GoogleTokenProvider::new(
            push.service_account.clone(),
            http_client.clone(),
        ));

        let mut profile_lookup = FirestoreProfileLookup::new(
            push.project_id.clone(),
            token_provider.clone(),
            http_client.clone(),
        );
        if let Some(endpoint) = &push.firestore_endpoint {
            profile_lookup = profile_lookup.with_endpoint(endpoint.as_str());
        }

        let mut gateway =
            FcmNotificationGateway::new(push.project_id.clone(), token_provider, http_client);
        if let Some(endpoint) = &push.fcm_endpoint {
            gateway = gateway.with_endpoint(endpoint.as_str());
        }

        tracing::info!(
            "Push notifications enabled for project '{}' ({})",
            push.project_id,
            push.service_account.client_email
        );
        (Arc::new(profile_lookup), Arc::new(gateway))
    }
}
