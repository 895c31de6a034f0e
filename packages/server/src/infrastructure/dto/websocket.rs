//! WebSocket message DTOs.
//!
//! Inbound (client → server):
//! - `{"type":"register","userId":"alice"}`
//! - `{"type":"message","recipientId":"bob","text":"hi"}`
//!
//! Outbound (server → client):
//! - `{"senderId":"alice","text":"hi"}`
//! - `{"type":"error","code":"not_registered","message":"..."}`

use serde::{Deserialize, Serialize};

/// Message sent by a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum InboundMessage {
    Register { user_id: String },
    Message { recipient_id: String, text: String },
}

/// Chat message delivered to a recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveredMessage {
    pub sender_id: String,
    pub text: String,
}

/// Type tag for server-originated control messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageType {
    Error,
}

/// Rejection sent back to the originating connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub r#type: MessageType,
    pub code: String,
    pub message: String,
}
