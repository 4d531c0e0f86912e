use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A chat message scoped to one booking's two-party conversation.
/// Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub booking_id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    /// Derived from the viewing session, never sent over the wire.
    #[serde(skip)]
    pub sent_by_local_user: bool,
}

impl Message {
    /// An optimistic message authored locally, assumed delivered.
    pub fn outgoing(booking_id: &str, sender_id: &str, receiver_id: &str, text: &str) -> Self {
        Self {
            id: format!("local-{}", Uuid::new_v4()),
            booking_id: booking_id.to_string(),
            sender_id: sender_id.to_string(),
            receiver_id: receiver_id.to_string(),
            text: text.to_string(),
            created_at: Utc::now(),
            sent_by_local_user: true,
        }
    }

    /// A message delivered live over the real-time channel. The channel
    /// carries no id or timestamp, so both are assigned on arrival.
    pub fn arrived(booking_id: &str, sender_id: &str, receiver_id: &str, text: &str, local_user_id: &str) -> Self {
        Self {
            id: format!("live-{}", Uuid::new_v4()),
            booking_id: booking_id.to_string(),
            sender_id: sender_id.to_string(),
            receiver_id: receiver_id.to_string(),
            text: text.to_string(),
            created_at: Utc::now(),
            sent_by_local_user: sender_id == local_user_id,
        }
    }

    pub fn is_local(&self) -> bool {
        self.id.starts_with("local-")
    }
}
