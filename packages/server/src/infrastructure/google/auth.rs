//! サービスアカウントによる OAuth2 アクセストークンの取得とキャッシュ
//!
//! 1. サービスアカウント鍵で RS256 の JWT を署名
//! 2. `token_uri` で JWT をアクセストークンに交換
//! 3. 期限の 60 秒前までキャッシュを使い回す

use std::path::Path;

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Error)]
pub enum GoogleAuthError {
    #[error("failed to read service account file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse service account file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to sign assertion: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("token request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("token request failed with status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Firebase / Google Cloud service account key (JSON downloaded from the console)
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub project_id: String,
    pub private_key: String,
    pub client_email: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self, GoogleAuthError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, GoogleAuthError> {
        let json = std::fs::read_to_string(path).map_err(|source| GoogleAuthError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }
}

// private_key は出さない
impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    sub: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: i64,
}

enum TokenSource {
    ServiceAccount {
        key: ServiceAccountKey,
        cache: Mutex<Option<CachedToken>>,
    },
    Fixed(String),
}

/// OAuth2 access token provider shared by the Google adapters
pub struct GoogleTokenProvider {
    source: TokenSource,
    http_client: reqwest::Client,
}

impl GoogleTokenProvider {
    pub fn new(key: ServiceAccountKey, http_client: reqwest::Client) -> Self {
        Self {
            source: TokenSource::ServiceAccount {
                key,
                cache: Mutex::new(None),
            },
            http_client,
        }
    }

    /// 固定トークンを返すプロバイダ（エミュレータやテスト用）
    pub fn fixed(token: impl Into<String>) -> Self {
        Self {
            source: TokenSource::Fixed(token.into()),
            http_client: reqwest::Client::new(),
        }
    }

    /// Get an access token, refreshing it when it is about to expire
    pub async fn access_token(&self) -> Result<String, GoogleAuthError> {
        let (key, cache) = match &self.source {
            TokenSource::Fixed(token) => return Ok(token.clone()),
            TokenSource::ServiceAccount { key, cache } => (key, cache),
        };

        // 更新中は他の呼び出しを待たせ、同時に何本も交換リクエストを出さない
        let mut cache = cache.lock().await;
        let now = Utc::now().timestamp();
        if let Some(cached) = cache.as_ref()
            && cached.expires_at > now + REFRESH_MARGIN_SECS
        {
            return Ok(cached.access_token.clone());
        }

        let assertion = sign_assertion(key, now)?;
        let response = self
            .http_client
            .post(&key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GoogleAuthError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response.json().await?;
        tracing::debug!(
            "Obtained Google access token for '{}' (expires in {}s)",
            key.client_email,
            token.expires_in
        );
        *cache = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at: Utc::now().timestamp() + token.expires_in,
        });

        Ok(token.access_token)
    }
}

fn sign_assertion(key: &ServiceAccountKey, now: i64) -> Result<String, GoogleAuthError> {
    let claims = JwtClaims {
        iss: &key.client_email,
        sub: &key.client_email,
        scope: CLOUD_PLATFORM_SCOPE,
        aud: &key.token_uri,
        iat: now,
        exp: now + Duration::hours(1).num_seconds(),
    };
    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
    Ok(encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)?)
}
