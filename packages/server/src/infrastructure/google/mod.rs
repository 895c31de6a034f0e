//! Google Cloud 共通部品
//!
//! FCM と Firestore の両方が同じサービスアカウントの OAuth2 アクセストークンを使う。

pub mod auth;

pub use auth::{GoogleAuthError, GoogleTokenProvider, ServiceAccountKey};
