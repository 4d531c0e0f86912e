use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tracing::{debug, warn};

use homefix_shared::models::events::JoinChat;
use homefix_shared::{InboundEvent, OutboundEvent};

/// Logical grouping used to scope real-time delivery.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Room {
    /// Keyed by user id; carries booking pushes and booking responses.
    User(String),
    /// Keyed by booking id; carries chat messages.
    Booking { booking_id: String, user_id: String },
}

impl Room {
    /// The event that announces membership to the backend.
    pub fn join_event(&self) -> OutboundEvent {
        match self {
            Room::User(user_id) => OutboundEvent::Join { user_id: user_id.clone() },
            Room::Booking { booking_id, user_id } => OutboundEvent::JoinChat(JoinChat {
                booking_id: booking_id.clone(),
                user_id: user_id.clone(),
            }),
        }
    }

    pub fn accepts(&self, event: &InboundEvent) -> bool {
        match (self, event) {
            (Room::User(_), InboundEvent::NewBooking(_)) => true,
            (Room::User(_), InboundEvent::BookingResponse(_)) => true,
            (Room::Booking { booking_id, .. }, InboundEvent::ChatMessage(msg)) => {
                msg.booking_id.as_deref().map_or(true, |id| id == booking_id)
            }
            _ => false,
        }
    }
}

/// Receiving end of one room. Dropping it detaches the listener.
pub struct Subscription {
    room: Room,
    rx: broadcast::Receiver<InboundEvent>,
}

impl Subscription {
    pub fn new(room: Room, rx: broadcast::Receiver<InboundEvent>) -> Self {
        Self { room, rx }
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    /// Next event for this room, or `None` once the channel is gone.
    pub async fn next(&mut self) -> Option<InboundEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.room.accepts(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(room = ?self.room, skipped, "subscriber lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// A persistent bidirectional channel with explicit room lifecycle.
///
/// No acknowledgement and no offline queue: `publish` while disconnected
/// returns `false` and the event is lost.
pub trait RealtimeChannel: Send + Sync {
    /// Announces membership and returns a listener scoped to the room.
    fn join(&self, room: Room) -> Subscription;

    /// Stops re-announcing the room after reconnects.
    fn leave(&self, room: &Room);

    fn publish(&self, event: OutboundEvent) -> bool;

    fn is_connected(&self) -> bool;
}

/// Joined rooms plus the inbound fan-out. Shared by channel implementations.
///
/// Rooms are counted per join, so a room stays announced until every
/// holder has left it.
pub struct RoomRegistry {
    rooms: Mutex<HashMap<Room, usize>>,
    inbound: broadcast::Sender<InboundEvent>,
}

impl RoomRegistry {
    pub fn new(capacity: usize) -> Self {
        let (inbound, _) = broadcast::channel(capacity);
        Self { rooms: Mutex::new(HashMap::new()), inbound }
    }

    pub fn insert(&self, room: Room) -> Subscription {
        let rx = self.inbound.subscribe();
        if let Ok(mut rooms) = self.rooms.lock() {
            *rooms.entry(room.clone()).or_insert(0) += 1;
        }
        Subscription::new(room, rx)
    }

    /// Drops one holder. Returns `true` once the last holder is gone.
    pub fn remove(&self, room: &Room) -> bool {
        let Ok(mut rooms) = self.rooms.lock() else {
            return false;
        };
        match rooms.get_mut(room) {
            Some(count) if *count > 1 => {
                *count -= 1;
                false
            }
            Some(_) => {
                rooms.remove(room);
                true
            }
            None => false,
        }
    }

    pub fn joined(&self) -> Vec<Room> {
        self.rooms.lock().map(|rooms| rooms.keys().cloned().collect()).unwrap_or_default()
    }

    /// Fans an inbound event out to every live subscription.
    pub fn dispatch(&self, event: InboundEvent) {
        debug!(event = event.name(), "inbound event");
        // No receivers is fine: nobody is listening right now.
        let _ = self.inbound.send(event);
    }
}

/// In-process channel. Records what was published and lets the caller
/// inject inbound events.
pub struct MemoryChannel {
    registry: RoomRegistry,
    connected: AtomicBool,
    published: Arc<Mutex<Vec<OutboundEvent>>>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self {
            registry: RoomRegistry::new(64),
            connected: AtomicBool::new(true),
            published: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn deliver(&self, event: InboundEvent) {
        self.registry.dispatch(event);
    }

    pub fn published(&self) -> Vec<OutboundEvent> {
        self.published.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn joined(&self) -> Vec<Room> {
        self.registry.joined()
    }
}

impl Default for MemoryChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl RealtimeChannel for MemoryChannel {
    fn join(&self, room: Room) -> Subscription {
        self.publish(room.join_event());
        self.registry.insert(room)
    }

    fn leave(&self, room: &Room) {
        self.registry.remove(room);
    }

    fn publish(&self, event: OutboundEvent) -> bool {
        if !self.is_connected() {
            debug!(event = event.name(), "channel offline, event dropped");
            return false;
        }
        if let Ok(mut published) = self.published.lock() {
            published.push(event);
        }
        true
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
