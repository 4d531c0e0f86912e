//! Payloads carried by the real-time notification channel.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::booking::BookingStatus;

pub const EVENT_JOIN: &str = "join";
pub const EVENT_JOIN_CHAT: &str = "join_chat";
pub const EVENT_NEW_BOOKING: &str = "new_booking";
pub const EVENT_BOOKING_REQUEST: &str = "booking_request";
pub const EVENT_SEND_CHAT_MESSAGE: &str = "send_chat_message";
pub const EVENT_RECEIVE_CHAT_MESSAGE: &str = "receive_chat_message";
pub const EVENT_BOOKING_RESPONSE: &str = "booking_response";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JoinChat {
    pub booking_id: String,
    pub user_id: String,
}

/// Push delivered to a technician's user room when a booking arrives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewBookingNotice {
    #[serde(default)]
    pub message: String,
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessagePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<String>,
    pub sender_id: String,
    pub receiver_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponsePayload {
    pub booking_id: String,
    pub technician_id: String,
    pub status: BookingStatus,
}

/// Events consumed from the channel.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    NewBooking(NewBookingNotice),
    ChatMessage(ChatMessagePayload),
    BookingResponse(BookingResponsePayload),
}

impl InboundEvent {
    /// Decodes a named event. Unknown event names yield `Ok(None)`.
    pub fn decode(name: &str, payload: Value) -> Result<Option<Self>, serde_json::Error> {
        let event = match name {
            EVENT_NEW_BOOKING | EVENT_BOOKING_REQUEST => {
                // Older backends push a bare string.
                let notice = match payload {
                    Value::String(message) => NewBookingNotice { message, booking_id: None },
                    other => serde_json::from_value(other)?,
                };
                InboundEvent::NewBooking(notice)
            }
            EVENT_RECEIVE_CHAT_MESSAGE => InboundEvent::ChatMessage(serde_json::from_value(payload)?),
            EVENT_BOOKING_RESPONSE => InboundEvent::BookingResponse(serde_json::from_value(payload)?),
            _ => return Ok(None),
        };
        Ok(Some(event))
    }

    pub fn name(&self) -> &'static str {
        match self {
            InboundEvent::NewBooking(_) => EVENT_NEW_BOOKING,
            InboundEvent::ChatMessage(_) => EVENT_RECEIVE_CHAT_MESSAGE,
            InboundEvent::BookingResponse(_) => EVENT_BOOKING_RESPONSE,
        }
    }
}

/// Events produced onto the channel.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    Join { user_id: String },
    JoinChat(JoinChat),
    SendChatMessage(ChatMessagePayload),
    BookingResponse(BookingResponsePayload),
}

impl OutboundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::Join { .. } => EVENT_JOIN,
            OutboundEvent::JoinChat(_) => EVENT_JOIN_CHAT,
            OutboundEvent::SendChatMessage(_) => EVENT_SEND_CHAT_MESSAGE,
            OutboundEvent::BookingResponse(_) => EVENT_BOOKING_RESPONSE,
        }
    }

    pub fn payload(&self) -> Value {
        let encoded = match self {
            OutboundEvent::Join { user_id } => Ok(Value::String(user_id.clone())),
            OutboundEvent::JoinChat(join) => serde_json::to_value(join),
            OutboundEvent::SendChatMessage(msg) => serde_json::to_value(msg),
            OutboundEvent::BookingResponse(resp) => serde_json::to_value(resp),
        };
        // Plain derived structs of strings always serialize.
        encoded.unwrap_or(Value::Null)
    }
}
