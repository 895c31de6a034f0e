//! Conversion logic between DTOs and domain types.

use thiserror::Error;

use tayori_shared::time::timestamp_to_rfc3339;

use crate::domain::{
    ChatMessage, InboundEvent, MessageText, OutboundFrame, QueuedMessage, UserId, ValueObjectError,
};
use crate::infrastructure::dto::{http, websocket as dto};

/// Inbound payload that could not be turned into an event
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload is not a valid message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload has an invalid field: {0}")]
    Invalid(#[from] ValueObjectError),
}

// ========================================
// DTO → Domain
// ========================================

impl TryFrom<dto::InboundMessage> for InboundEvent {
    type Error = ValueObjectError;

    fn try_from(dto: dto::InboundMessage) -> Result<Self, Self::Error> {
        match dto {
            dto::InboundMessage::Register { user_id } => Ok(InboundEvent::Register {
                user_id: UserId::new(user_id)?,
            }),
            dto::InboundMessage::Message { recipient_id, text } => Ok(InboundEvent::Message {
                recipient_id: UserId::new(recipient_id)?,
                text: MessageText::new(text)?,
            }),
        }
    }
}

/// Decode a text frame into an inbound event.
pub fn decode_inbound(text: &str) -> Result<InboundEvent, DecodeError> {
    let dto: dto::InboundMessage = serde_json::from_str(text)?;
    Ok(InboundEvent::try_from(dto)?)
}

// ========================================
// Domain → DTO
// ========================================

impl From<ChatMessage> for dto::DeliveredMessage {
    fn from(model: ChatMessage) -> Self {
        Self {
            sender_id: model.sender_id.into_string(),
            text: model.text.into_string(),
        }
    }
}

impl From<QueuedMessage> for http::QueuedMessageDto {
    fn from(model: QueuedMessage) -> Self {
        Self {
            sender_id: model.message.sender_id.into_string(),
            text: model.message.text.into_string(),
            queued_at: timestamp_to_rfc3339(model.queued_at.value()),
        }
    }
}

/// Encode an outbound frame as a JSON text frame.
pub fn encode_outbound(frame: OutboundFrame) -> Result<String, serde_json::Error> {
    match frame {
        OutboundFrame::Deliver(message) => {
            serde_json::to_string(&dto::DeliveredMessage::from(message))
        }
        OutboundFrame::Rejected(code) => serde_json::to_string(&dto::ErrorMessage {
            r#type: dto::MessageType::Error,
            code: code.as_str().to_string(),
            message: code.description().to_string(),
        }),
    }
}
