//! ProfileLookup 実装
//!
//! - `firestore`: Firestore REST API（`users/{userId}` ドキュメントの `fcmToken`）
//! - `disabled`: 常に「トークンなし」を返す（認証情報なしで起動した場合）

pub mod disabled;
pub mod firestore;

pub use disabled::DisabledProfileLookup;
pub use firestore::FirestoreProfileLookup;
