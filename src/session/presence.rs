//! Presence Registry
//!
//! Tracks which realtime connections belong to which merchant room and fans
//! events out to room members. Rooms are purely in-memory and rebuilt from
//! scratch on restart; connections re-establish themselves.
//!
//! Presence notifications are room-scoped: when a room's membership
//! transitions between empty and non-empty, only that room's members are
//! notified.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::types::{MerchantStatus, OutboundEvent};

type Room = HashMap<Uuid, UnboundedSender<OutboundEvent>>;

/// Room membership table keyed by merchant identity
#[derive(Clone, Default)]
pub struct PresenceRegistry {
    rooms: Arc<RwLock<HashMap<String, Room>>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to the room named `identity`
    ///
    /// Idempotent on repeat join: re-joining replaces the connection's
    /// outbound channel without a second presence notification.
    pub async fn join(
        &self,
        identity: &str,
        connection: Uuid,
        sender: UnboundedSender<OutboundEvent>,
    ) {
        let mut rooms = self.rooms.write().await;
        let room = rooms.entry(identity.to_string()).or_default();

        let was_empty = room.is_empty();
        room.insert(connection, sender);

        if was_empty {
            tracing::debug!(identity = %identity, "room online");
            send_to_room(room, &OutboundEvent::MerchantStatus(MerchantStatus::Online));
        }
    }

    /// Remove a connection from the room named `identity`
    ///
    /// Unknown connections and rooms are ignored. Emptied rooms are dropped;
    /// the offline notification then has no members left to reach, which is
    /// the no-op delivery case.
    pub async fn leave(&self, identity: &str, connection: &Uuid) {
        let mut rooms = self.rooms.write().await;
        let Some(room) = rooms.get_mut(identity) else {
            return;
        };

        if room.remove(connection).is_some() && room.is_empty() {
            tracing::debug!(identity = %identity, "room offline");
            send_to_room(room, &OutboundEvent::MerchantStatus(MerchantStatus::Offline));
            rooms.remove(identity);
        }
    }

    /// Whether the room named `identity` has at least one member
    pub async fn is_online(&self, identity: &str) -> bool {
        self.rooms
            .read()
            .await
            .get(identity)
            .is_some_and(|room| !room.is_empty())
    }

    /// Deliver `event` to every member of the room named `identity`
    ///
    /// Delivering to zero members is a silent no-op. Connections whose
    /// channel is gone are pruned from the room.
    pub async fn broadcast(&self, identity: &str, event: OutboundEvent) {
        let mut rooms = self.rooms.write().await;
        let Some(room) = rooms.get_mut(identity) else {
            return;
        };

        room.retain(|_, sender| sender.send(event.clone()).is_ok());
        if room.is_empty() {
            rooms.remove(identity);
        }
    }

    /// Number of rooms with at least one member
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

fn send_to_room(room: &Room, event: &OutboundEvent) {
    for sender in room.values() {
        let _ = sender.send(event.clone());
    }
}
