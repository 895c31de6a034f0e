//! Firestore REST API による ProfileLookup 実装
//!
//! `GET {endpoint}/v1/projects/{project}/databases/(default)/documents/{collection}/{userId}`
//!
//! - 404 → トークンなし
//! - `fields.fcmToken.stringValue` → トークン
//! - フィールドが無い・空文字列 → トークンなし
//! - ドキュメント ID として使えないユーザー ID（`.`、`..`、`__*__`）→ リクエストせずトークンなし

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use crate::{
    domain::{DeviceToken, ProfileLookup, ProfileLookupError, UserId},
    infrastructure::google::GoogleTokenProvider,
};

pub const DEFAULT_FIRESTORE_ENDPOINT: &str = "https://firestore.googleapis.com";
pub const DEFAULT_USERS_COLLECTION: &str = "users";
pub const TOKEN_FIELD: &str = "fcmToken";

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    /// フィールド名 → 型付き値（`{"stringValue": "..."}` など）
    #[serde(default)]
    fields: HashMap<String, serde_json::Map<String, serde_json::Value>>,
}

/// Firestore-backed profile lookup
pub struct FirestoreProfileLookup {
    project_id: String,
    endpoint: String,
    collection: String,
    token_provider: Arc<GoogleTokenProvider>,
    http_client: reqwest::Client,
}

impl FirestoreProfileLookup {
    pub fn new(
        project_id: String,
        token_provider: Arc<GoogleTokenProvider>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            project_id,
            endpoint: DEFAULT_FIRESTORE_ENDPOINT.to_string(),
            collection: DEFAULT_USERS_COLLECTION.to_string(),
            token_provider,
            http_client,
        }
    }

    /// ベース URL を差し替える（エミュレータ用）
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// ユーザー ID はパスセグメントとしてエスケープする
    fn document_url(&self, user_id: &UserId) -> Result<Url, ProfileLookupError> {
        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| ProfileLookupError::Transport(format!("invalid endpoint: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ProfileLookupError::Transport("endpoint cannot be a base".to_string()))?
            .pop_if_empty()
            .extend([
                "v1",
                "projects",
                self.project_id.as_str(),
                "databases",
                "(default)",
                "documents",
                self.collection.as_str(),
                user_id.as_str(),
            ]);
        Ok(url)
    }
}

/// Firestore のドキュメント ID として有効か
///
/// `.` と `..` はパスセグメントとして URL から消えてしまい、コレクション自体への GET になる。
fn is_valid_document_id(id: &str) -> bool {
    let dot_segment = id == "." || id == "..";
    let reserved_name = id.len() >= 4 && id.starts_with("__") && id.ends_with("__");
    !(dot_segment || reserved_name)
}

/// ドキュメントからデバイストークンを取り出す
fn extract_token(document: FirestoreDocument) -> Result<Option<DeviceToken>, ProfileLookupError> {
    let Some(value) = document.fields.get(TOKEN_FIELD) else {
        return Ok(None);
    };

    match value.get("stringValue") {
        Some(serde_json::Value::String(token)) if token.trim().is_empty() => Ok(None),
        Some(serde_json::Value::String(token)) => DeviceToken::new(token.clone())
            .map(Some)
            .map_err(|e| ProfileLookupError::MalformedDocument(e.to_string())),
        _ if value.contains_key("nullValue") => Ok(None),
        _ => Err(ProfileLookupError::MalformedDocument(format!(
            "field '{}' is not a string",
            TOKEN_FIELD
        ))),
    }
}

#[async_trait]
impl ProfileLookup for FirestoreProfileLookup {
    async fn get_token(&self, user_id: &UserId) -> Result<Option<DeviceToken>, ProfileLookupError> {
        if !is_valid_document_id(user_id.as_str()) {
            tracing::debug!("'{}' is not a valid document ID; treating as no token", user_id);
            return Ok(None);
        }

        let access_token = self
            .token_provider
            .access_token()
            .await
            .map_err(|e| ProfileLookupError::Auth(e.to_string()))?;

        let response = self
            .http_client
            .get(self.document_url(user_id)?)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ProfileLookupError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                tracing::debug!("No profile document for '{}'", user_id);
                Ok(None)
            }
            status if status.is_success() => {
                let document: FirestoreDocument = response
                    .json()
                    .await
                    .map_err(|e| ProfileLookupError::MalformedDocument(e.to_string()))?;
                extract_token(document)
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(ProfileLookupError::Api {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        extract::{Path, State},
        http::StatusCode as HttpStatus,
        routing::get,
    };
    use serde_json::{Value, json};

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - ドキュメントの有無・フィールドの有無に応じたトークン解決
    // - エラー応答の扱い
    //
    // ローカルに立てた axum サーバーを Firestore の代わりに使う。
    // ========================================

    type Documents = Arc<HashMap<String, (HttpStatus, Value)>>;

    async fn fake_get(
        State(documents): State<Documents>,
        Path((_project, user_id)): Path<(String, String)>,
    ) -> (HttpStatus, Json<Value>) {
        match documents.get(&user_id) {
            Some((status, body)) => (*status, Json(body.clone())),
            None => (
                HttpStatus::NOT_FOUND,
                Json(json!({"error": {"code": 404, "status": "NOT_FOUND"}})),
            ),
        }
    }

    async fn start_fake_firestore(documents: Vec<(&str, HttpStatus, Value)>) -> String {
        let documents: Documents = Arc::new(
            documents
                .into_iter()
                .map(|(id, status, body)| (id.to_string(), (status, body)))
                .collect(),
        );
        let app = Router::new()
            .route(
                "/v1/projects/{project}/databases/(default)/documents/users/{user_id}",
                get(fake_get),
            )
            .with_state(documents);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn lookup(endpoint: &str) -> FirestoreProfileLookup {
        FirestoreProfileLookup::new(
            "chatapp".to_string(),
            Arc::new(GoogleTokenProvider::fixed("owner")),
            reqwest::Client::new(),
        )
        .with_endpoint(endpoint)
    }

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_returns_token_from_document() {
        // テスト項目: ドキュメントの fcmToken が返される
        // given (前提条件):
        let endpoint = start_fake_firestore(vec![(
            "carol",
            HttpStatus::OK,
            json!({
                "name": "projects/chatapp/databases/(default)/documents/users/carol",
                "fields": {"fcmToken": {"stringValue": "carol-device"}}
            }),
        )])
        .await;

        // when (操作):
        let token = lookup(&endpoint).get_token(&user("carol")).await.unwrap();

        // then (期待する結果):
        assert_eq!(token.map(|t| t.as_str().to_string()), Some("carol-device".to_string()));
    }

    #[tokio::test]
    async fn test_missing_document_returns_none() {
        // テスト項目: ドキュメントが存在しない場合はトークンなし
        // given (前提条件):
        let endpoint = start_fake_firestore(vec![]).await;

        // when (操作):
        let token = lookup(&endpoint).get_token(&user("dave")).await.unwrap();

        // then (期待する結果):
        assert!(token.is_none());
    }

    #[tokio::test]
    async fn test_document_without_token_field_returns_none() {
        // テスト項目: fcmToken フィールドが無いドキュメントはトークンなし
        // given (前提条件):
        let endpoint = start_fake_firestore(vec![(
            "dave",
            HttpStatus::OK,
            json!({"fields": {"displayName": {"stringValue": "Dave"}}}),
        )])
        .await;

        // when (操作):
        let token = lookup(&endpoint).get_token(&user("dave")).await.unwrap();

        // then (期待する結果):
        assert!(token.is_none());
    }

    #[tokio::test]
    async fn test_server_error_is_api_error() {
        // テスト項目: 5xx 応答は Api エラーになる
        // given (前提条件):
        let endpoint = start_fake_firestore(vec![(
            "erin",
            HttpStatus::SERVICE_UNAVAILABLE,
            json!({"error": {"code": 503, "status": "UNAVAILABLE"}}),
        )])
        .await;

        // when (操作):
        let result = lookup(&endpoint).get_token(&user("erin")).await;

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(ProfileLookupError::Api { status: 503, .. })
        ));
    }

    #[test]
    fn test_document_url_escapes_user_id() {
        // テスト項目: ユーザー ID に含まれる "/" はパスセグメントとしてエスケープされる
        // given (前提条件):
        let lookup = lookup("http://localhost:8085");

        // when (操作):
        let url = lookup.document_url(&user("a/b c")).unwrap();

        // then (期待する結果):
        assert_eq!(
            url.as_str(),
            "http://localhost:8085/v1/projects/chatapp/databases/(default)/documents/users/a%2Fb%20c"
        );
    }

    #[test]
    fn test_reserved_document_ids_are_rejected() {
        // テスト項目: "." / ".." / "__x__" はドキュメント ID として扱わない
        // given (前提条件):
        let reserved = [".", "..", "__name__", "____"];
        let allowed = ["alice", "...", "a.b", "__x", "x__", "a/b"];

        // when (操作):
        // then (期待する結果):
        for id in reserved {
            assert!(!is_valid_document_id(id), "{id:?} should be rejected");
        }
        for id in allowed {
            assert!(is_valid_document_id(id), "{id:?} should be allowed");
        }
    }

    #[tokio::test]
    async fn test_dot_segment_user_id_returns_none_without_request() {
        // テスト項目: ".." 宛てのトークン検索はコレクションへの GET を送らずトークンなしになる
        // given (前提条件):
        // 到達できないエンドポイント。リクエストを送れば Transport エラーになる
        let lookup = lookup("http://127.0.0.1:1");

        // when (操作):
        let dot = lookup.get_token(&user(".")).await;
        let dotdot = lookup.get_token(&user("..")).await;

        // then (期待する結果):
        assert!(matches!(dot, Ok(None)));
        assert!(matches!(dotdot, Ok(None)));
    }

    #[test]
    fn test_null_token_field_returns_none() {
        // テスト項目: fcmToken が null の場合はトークンなし
        // given (前提条件):
        let document: FirestoreDocument =
            serde_json::from_value(json!({"fields": {"fcmToken": {"nullValue": null}}})).unwrap();

        // when (操作):
        let result = extract_token(document);

        // then (期待する結果):
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn test_non_string_token_field_is_malformed() {
        // テスト項目: fcmToken が文字列でない場合は MalformedDocument エラーになる
        // given (前提条件):
        let document: FirestoreDocument =
            serde_json::from_value(json!({"fields": {"fcmToken": {"integerValue": "42"}}}))
                .unwrap();

        // when (操作):
        let result = extract_token(document);

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(ProfileLookupError::MalformedDocument(_))
        ));
    }
}
