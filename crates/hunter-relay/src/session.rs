//! Per-connection back-reference to the room it sits in.

use hunter_common::ConnectionId;

use crate::protocol::Slot;
use crate::room::RoomId;

/// Lives exactly as long as its connection. Never owns the room; the room
/// owns the player state keyed by [`ConnectionId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSession {
    pub id: ConnectionId,
    pub room: Option<RoomId>,
    pub slot: Option<Slot>,
}

impl ConnectionSession {
    pub fn new(id: ConnectionId) -> Self {
        Self {
            id,
            room: None,
            slot: None,
        }
    }

    pub fn bind(&mut self, room: RoomId, slot: Slot) {
        self.room = Some(room);
        self.slot = Some(slot);
    }

    /// Clear the binding, returning the room it pointed at.
    pub fn unbind(&mut self) -> Option<RoomId> {
        self.slot = None;
        self.room.take()
    }

    pub fn is_bound(&self) -> bool {
        self.room.is_some()
    }
}
