//! Room records and the process-wide room table.

use std::collections::HashMap;
use std::fmt;

use hunter_common::ConnectionId;
use rand::Rng;
use serde::Serialize;

use crate::errors::RequestError;
use crate::game::Phase;
use crate::protocol::Slot;

pub const ROOM_ID_LEN: usize = 6;
pub const ROOM_ID_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Level every player starts (and restarts) at.
pub const INITIAL_LEVEL: u32 = 2;

/// Whether `value` could be a canonical room code at all.
pub fn is_valid_room_id(value: &str) -> bool {
    value.len() == ROOM_ID_LEN && value.bytes().all(|b| ROOM_ID_ALPHABET.contains(&b))
}

// ---------------------------------------------------------------------------
// Room ID
// ---------------------------------------------------------------------------

/// Canonical (uppercase) room code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..ROOM_ID_LEN)
            .map(|_| ROOM_ID_ALPHABET[rng.gen_range(0..ROOM_ID_ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    /// Canonicalize user input: codes are matched case-insensitively.
    pub fn normalize(input: &str) -> Self {
        Self(input.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// Per-room tuning. Only `target_level` drives the room lifecycle. The
/// difficulty values are stored with the room as opaque tuning and are not
/// sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoomConfig {
    pub target_level: u32,
    pub diff_start: f64,
    pub diff_min: f64,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            target_level: 15,
            diff_start: 16.0,
            diff_min: 1.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerState {
    pub id: Slot,
    pub ready: bool,
    pub score: u64,
    pub level: u32,
}

impl PlayerState {
    pub fn new(id: Slot) -> Self {
        Self {
            id,
            ready: false,
            score: 0,
            level: INITIAL_LEVEL,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.ready = false;
        self.score = 0;
        self.level = INITIAL_LEVEL;
    }
}

#[derive(Debug)]
pub struct Room {
    id: RoomId,
    pub(crate) players: HashMap<ConnectionId, PlayerState>,
    pub(crate) phase: Phase,
    pub(crate) countdown_epoch: u64,
    config: RoomConfig,
}

impl Room {
    pub const CAPACITY: usize = 2;

    pub fn new(id: RoomId, config: RoomConfig) -> Self {
        Self {
            id,
            players: HashMap::new(),
            phase: Phase::Waiting,
            countdown_epoch: 0,
            config,
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= Self::CAPACITY
    }

    pub fn player(&self, conn: &ConnectionId) -> Option<&PlayerState> {
        self.players.get(conn)
    }

    pub fn slot_of(&self, conn: &ConnectionId) -> Option<Slot> {
        self.players.get(conn).map(|p| p.id)
    }

    /// Occupants ordered by slot, so fan-out order is deterministic.
    pub fn occupants(&self) -> Vec<ConnectionId> {
        let mut seated: Vec<(&ConnectionId, Slot)> =
            self.players.iter().map(|(conn, p)| (conn, p.id)).collect();
        seated.sort_by_key(|(_, slot)| *slot);
        seated.into_iter().map(|(conn, _)| conn.clone()).collect()
    }

    /// Seat a connection in the vacant slot: A for the first occupant,
    /// B for the second (or A again if the creator has since left).
    pub fn admit(&mut self, conn: ConnectionId) -> Result<Slot, RequestError> {
        if self.is_full() {
            return Err(RequestError::RoomFull);
        }
        if self.game_started() {
            return Err(RequestError::GameAlreadyStarted);
        }
        let slot = Slot::ALL
            .into_iter()
            .find(|slot| self.players.values().all(|p| p.id != *slot))
            .ok_or(RequestError::RoomFull)?;
        self.players.insert(conn, PlayerState::new(slot));
        Ok(slot)
    }

    /// Remove a connection's seat. A pending countdown or running match
    /// cannot continue without both players, so it falls back to `Waiting`.
    pub fn remove_player(&mut self, conn: &ConnectionId) -> Option<PlayerState> {
        let removed = self.players.remove(conn)?;
        self.abandon_match();
        Some(removed)
    }
}

// ---------------------------------------------------------------------------
// Room Store
// ---------------------------------------------------------------------------

/// Owns every live room. Empty at start, never persisted.
#[derive(Debug, Default)]
pub struct RoomStore {
    rooms: HashMap<RoomId, Room>,
    default_config: RoomConfig,
}

impl RoomStore {
    pub fn new(default_config: RoomConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            default_config,
        }
    }

    /// Create an empty room under a fresh code.
    pub fn create(&mut self) -> (RoomId, &mut Room) {
        self.create_with(&mut rand::thread_rng())
    }

    /// Same as [`RoomStore::create`] with an explicit RNG. Codes that collide
    /// with a live room are redrawn.
    pub fn create_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> (RoomId, &mut Room) {
        let id = loop {
            let candidate = RoomId::generate(rng);
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
            tracing::debug!(room = %candidate, "Room code collision, redrawing");
        };
        let config = self.default_config;
        let room = self
            .rooms
            .entry(id.clone())
            .or_insert_with(|| Room::new(id.clone(), config));
        (id, room)
    }

    pub fn get(&self, id: &RoomId) -> Option<&Room> {
        self.rooms.get(id)
    }

    pub fn get_mut(&mut self, id: &RoomId) -> Option<&mut Room> {
        self.rooms.get_mut(id)
    }

    pub fn contains(&self, id: &RoomId) -> bool {
        self.rooms.contains_key(id)
    }

    /// Delete a room. No-op for unknown ids.
    pub fn remove(&mut self, id: &RoomId) -> Option<Room> {
        self.rooms.remove(id)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn generated_ids_are_six_base36_chars() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let id = RoomId::generate(&mut rng);
            assert!(is_valid_room_id(id.as_str()), "bad id {id}");
        }
    }

    #[test]
    fn normalize_uppercases_and_trims() {
        assert_eq!(RoomId::normalize(" x1y2z3 ").as_str(), "X1Y2Z3");
        assert_eq!(RoomId::normalize("ABC123"), RoomId::normalize("abc123"));
    }

    #[test]
    fn room_id_validation() {
        assert!(is_valid_room_id("X1Y2Z3"));
        assert!(!is_valid_room_id("x1y2z3"));
        assert!(!is_valid_room_id("X1Y2Z"));
        assert!(!is_valid_room_id("X1Y2Z3A"));
        assert!(!is_valid_room_id("X1-2Z3"));
    }

    #[test]
    fn create_redraws_on_collision() {
        let mut store = RoomStore::default();
        let first = store.create_with(&mut StdRng::seed_from_u64(7)).0;
        // Same seed: the first candidate is taken, so a second draw is used.
        let second = store.create_with(&mut StdRng::seed_from_u64(7)).0;
        assert_ne!(first, second);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn create_uses_default_config() {
        let config = RoomConfig {
            target_level: 9,
            ..RoomConfig::default()
        };
        let mut store = RoomStore::new(config);
        let (_, room) = store.create();
        assert_eq!(room.config().target_level, 9);
        assert!(room.is_empty());
    }

    #[test]
    fn get_and_remove() {
        let mut store = RoomStore::default();
        let (id, _) = store.create();
        assert!(store.get(&id).is_some());
        assert!(store.remove(&id).is_some());
        assert!(store.get(&id).is_none());
        // Removing twice is a no-op.
        assert!(store.remove(&id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn slots_assigned_in_join_order() {
        let mut room = Room::new(RoomId::normalize("ABCDEF"), RoomConfig::default());
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        assert_eq!(room.admit(a.clone()), Ok(Slot::A));
        assert_eq!(room.admit(b.clone()), Ok(Slot::B));
        assert_eq!(room.occupants(), vec![a, b]);
    }

    #[test]
    fn third_player_is_rejected() {
        let mut room = Room::new(RoomId::normalize("ABCDEF"), RoomConfig::default());
        room.admit(ConnectionId::new()).unwrap();
        room.admit(ConnectionId::new()).unwrap();
        assert_eq!(room.admit(ConnectionId::new()), Err(RequestError::RoomFull));
        assert_eq!(room.len(), 2);
    }

    #[test]
    fn vacant_slot_is_reused() {
        let mut room = Room::new(RoomId::normalize("ABCDEF"), RoomConfig::default());
        let a = ConnectionId::new();
        room.admit(a.clone()).unwrap();
        room.admit(ConnectionId::new()).unwrap();
        room.remove_player(&a);
        assert_eq!(room.admit(ConnectionId::new()), Ok(Slot::A));
    }

    #[test]
    fn new_player_state_defaults() {
        let p = PlayerState::new(Slot::B);
        assert_eq!(p.id, Slot::B);
        assert!(!p.ready);
        assert_eq!(p.score, 0);
        assert_eq!(p.level, INITIAL_LEVEL);
    }
}
