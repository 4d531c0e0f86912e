use homefix_core::backend::HistoryEntry;
use homefix_shared::models::events::ChatMessagePayload;
use homefix_shared::Message;

/// Ordered message list for one booking's two-party conversation.
///
/// History is ordered by creation time once, at load. Everything after
/// that is kept in arrival order.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    booking_id: String,
    local_user_id: String,
    counterpart_id: String,
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new(booking_id: &str, local_user_id: &str, counterpart_id: &str) -> Self {
        Self {
            booking_id: booking_id.to_string(),
            local_user_id: local_user_id.to_string(),
            counterpart_id: counterpart_id.to_string(),
            messages: Vec::new(),
        }
    }

    /// Replaces the list with server history, oldest first.
    pub fn load_history(&mut self, entries: Vec<HistoryEntry>) {
        let mut messages: Vec<Message> = entries
            .into_iter()
            .filter(|e| self.is_between_parties(&e.sender_id, &e.receiver_id))
            .map(|e| Message {
                sent_by_local_user: e.sender_id == self.local_user_id,
                id: e.id,
                booking_id: self.booking_id.clone(),
                sender_id: e.sender_id,
                receiver_id: e.receiver_id,
                text: e.text,
                created_at: e.created_at,
            })
            .collect();
        messages.sort_by_key(|m| m.created_at);
        self.messages = messages;
    }

    /// Appends an optimistic local message and returns it.
    pub fn push_outgoing(&mut self, text: &str) -> &Message {
        let message = Message::outgoing(&self.booking_id, &self.local_user_id, &self.counterpart_id, text);
        self.push(message)
    }

    /// Appends a live message if it belongs to this conversation.
    ///
    /// Echoes of our own sends are appended too; there is no matching
    /// against optimistic copies.
    pub fn push_arrived(&mut self, payload: &ChatMessagePayload) -> Option<&Message> {
        if let Some(booking_id) = payload.booking_id.as_deref() {
            if booking_id != self.booking_id {
                return None;
            }
        }
        if !self.is_between_parties(&payload.sender_id, &payload.receiver_id) {
            return None;
        }
        let message = Message::arrived(
            &self.booking_id,
            &payload.sender_id,
            &payload.receiver_id,
            &payload.message,
            &self.local_user_id,
        );
        Some(self.push(message))
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn push(&mut self, message: Message) -> &Message {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    fn is_between_parties(&self, sender: &str, receiver: &str) -> bool {
        (sender == self.local_user_id && receiver == self.counterpart_id)
            || (sender == self.counterpart_id && receiver == self.local_user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entry(id: &str, sender: &str, receiver: &str, minute: u32) -> HistoryEntry {
        HistoryEntry {
            id: id.to_string(),
            sender_id: sender.to_string(),
            receiver_id: receiver.to_string(),
            text: format!("message {}", id),
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 10, minute, 0).unwrap(),
        }
    }

    fn live(booking_id: Option<&str>, sender: &str, receiver: &str, text: &str) -> ChatMessagePayload {
        ChatMessagePayload {
            booking_id: booking_id.map(str::to_string),
            sender_id: sender.to_string(),
            receiver_id: receiver.to_string(),
            message: text.to_string(),
        }
    }

    #[test]
    fn test_history_sorted_by_creation_time() {
        let mut transcript = Transcript::new("abc123", "cust1", "tech1");
        transcript.load_history(vec![
            entry("m2", "tech1", "cust1", 5),
            entry("m1", "cust1", "tech1", 1),
            entry("m3", "cust1", "tech1", 9),
        ]);

        let ids: Vec<_> = transcript.messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2", "m3"]);
        assert!(transcript.messages()[0].sent_by_local_user);
        assert!(!transcript.messages()[1].sent_by_local_user);
        assert!(transcript.messages().iter().all(|m| m.booking_id == "abc123"));
    }

    #[test]
    fn test_history_from_other_conversations_is_dropped() {
        let mut transcript = Transcript::new("abc123", "cust1", "tech1");
        transcript.load_history(vec![entry("m1", "cust1", "tech1", 1), entry("m2", "cust1", "tech9", 2)]);
        assert_eq!(transcript.len(), 1);
    }

    #[test]
    fn test_live_messages_keep_arrival_order() {
        let mut transcript = Transcript::new("abc123", "cust1", "tech1");
        transcript.load_history(vec![entry("m1", "cust1", "tech1", 1)]);

        transcript.push_arrived(&live(None, "tech1", "cust1", "second")).unwrap();
        transcript.push_outgoing("third");
        transcript.push_arrived(&live(Some("abc123"), "tech1", "cust1", "fourth")).unwrap();

        let texts: Vec<_> = transcript.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["message m1", "second", "third", "fourth"]);
        assert!(transcript.messages()[2].is_local());
    }

    #[test]
    fn test_foreign_live_messages_are_ignored() {
        let mut transcript = Transcript::new("abc123", "cust1", "tech1");
        assert!(transcript.push_arrived(&live(Some("other"), "tech1", "cust1", "x")).is_none());
        assert!(transcript.push_arrived(&live(None, "tech2", "cust1", "x")).is_none());
        assert!(transcript.is_empty());
    }
}
