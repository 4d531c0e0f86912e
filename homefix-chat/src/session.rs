use std::sync::Arc;

use tracing::{debug, error, info, warn};

use homefix_core::{
    BookingBackend, CancelHandle, ClientError, ClientResult, MessageBackend, RealtimeChannel, Room, Subscription,
};
use homefix_shared::models::events::ChatMessagePayload;
use homefix_shared::{InboundEvent, Message, OutboundEvent};
use homefix_store::SessionStore;

use crate::transcript::Transcript;

pub const HISTORY_FAILED: &str = "Failed to load chat history.";

/// A live two-party conversation attached to one booking.
///
/// Holds the booking room until closed or dropped.
pub struct ChatSession {
    booking_id: String,
    user_id: String,
    counterpart_id: String,
    channel: Arc<dyn RealtimeChannel>,
    subscription: Subscription,
    transcript: Transcript,
    error: Option<String>,
}

impl ChatSession {
    /// Resolves the counterpart from the booking, loads prior messages and
    /// joins the booking room.
    ///
    /// A failed history fetch is not fatal: the session opens empty with
    /// [`HISTORY_FAILED`] as its inline error.
    pub async fn open(
        booking_id: &str,
        bookings: Arc<dyn BookingBackend>,
        messages: Arc<dyn MessageBackend>,
        session: Arc<SessionStore>,
        channel: Arc<dyn RealtimeChannel>,
    ) -> ClientResult<Self> {
        let user = session.require()?;

        let booking = bookings.get_booking(user.bearer(), booking_id).await?;
        let counterpart_id = booking
            .counterpart_of(&user.user_id)
            .ok_or_else(|| {
                ClientError::Validation("This booking has no one to chat with yet.".to_string())
            })?
            .to_string();

        let mut transcript = Transcript::new(booking_id, &user.user_id, &counterpart_id);
        let error = match messages.history(user.bearer(), &counterpart_id).await {
            Ok(entries) => {
                transcript.load_history(entries);
                None
            }
            Err(e) => {
                error!(booking_id, counterpart_id = %counterpart_id, "chat history failed: {}", e);
                Some(HISTORY_FAILED.to_string())
            }
        };

        let subscription = channel.join(Room::Booking {
            booking_id: booking_id.to_string(),
            user_id: user.user_id.clone(),
        });
        info!(booking_id, counterpart_id = %counterpart_id, history = transcript.len(), "chat opened");

        Ok(Self {
            booking_id: booking_id.to_string(),
            user_id: user.user_id,
            counterpart_id,
            channel,
            subscription,
            transcript,
            error,
        })
    }

    pub fn booking_id(&self) -> &str {
        &self.booking_id
    }

    pub fn counterpart_id(&self) -> &str {
        &self.counterpart_id
    }

    pub fn messages(&self) -> &[Message] {
        self.transcript.messages()
    }

    /// Inline error left by a failed history load.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Appends an optimistic copy and emits it without waiting for the
    /// channel. Returns `false` for blank input, which changes nothing.
    pub fn send(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }

        self.transcript.push_outgoing(text);
        let delivered = self.channel.publish(OutboundEvent::SendChatMessage(ChatMessagePayload {
            booking_id: Some(self.booking_id.clone()),
            sender_id: self.user_id.clone(),
            receiver_id: self.counterpart_id.clone(),
            message: text.to_string(),
        }));
        if !delivered {
            warn!(booking_id = %self.booking_id, "channel offline, message kept locally only");
        }
        true
    }

    /// Applies one inbound event. Returns the appended message, if any.
    pub fn apply(&mut self, event: &InboundEvent) -> Option<&Message> {
        match event {
            InboundEvent::ChatMessage(payload) => {
                let appended = self.transcript.push_arrived(payload);
                if appended.is_none() {
                    debug!(booking_id = %self.booking_id, sender = %payload.sender_id, "chat message for another conversation");
                }
                appended
            }
            _ => None,
        }
    }

    /// Waits for the next message of this conversation. Returns `None`
    /// when cancelled or when the channel shuts down.
    pub async fn next_message(&mut self, cancel: &CancelHandle) -> Option<Message> {
        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => return None,
                event = self.subscription.next() => event?,
            };
            if let Some(message) = self.apply(&event) {
                return Some(message.clone());
            }
        }
    }

    /// Consumes the session; the booking room is left on drop.
    pub fn close(self) {}
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.channel.leave(self.subscription.room());
        debug!(booking_id = %self.booking_id, "chat closed");
    }
}
