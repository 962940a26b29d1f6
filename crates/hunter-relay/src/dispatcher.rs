//! Protocol dispatcher: validates requests against room state, drives the
//! game state machine, and decides who hears about it.
//!
//! The dispatcher never touches sockets or timers. Each call returns the
//! [`Effect`]s the hub must carry out, in order.

use std::collections::HashMap;
use std::time::Duration;

use hunter_common::ConnectionId;
use tracing::{debug, info};

use crate::errors::RequestError;
use crate::protocol::{ClientMessage, ServerMessage, Slot};
use crate::room::{is_valid_room_id, Room, RoomConfig, RoomId, RoomStore};
use crate::session::ConnectionSession;

/// Default delay between `countdown_start` and `game_start`.
pub const COUNTDOWN: Duration = Duration::from_millis(3200);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Send {
        to: ConnectionId,
        message: ServerMessage,
    },
    ScheduleCountdown {
        room_id: RoomId,
        epoch: u64,
        delay: Duration,
    },
}

#[derive(Debug)]
pub struct Dispatcher {
    store: RoomStore,
    sessions: HashMap<ConnectionId, ConnectionSession>,
    countdown: Duration,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(RoomConfig::default(), COUNTDOWN)
    }
}

impl Dispatcher {
    pub fn new(room_config: RoomConfig, countdown: Duration) -> Self {
        Self {
            store: RoomStore::new(room_config),
            sessions: HashMap::new(),
            countdown,
        }
    }

    pub fn rooms(&self) -> &RoomStore {
        &self.store
    }

    pub fn session(&self, conn: &ConnectionId) -> Option<&ConnectionSession> {
        self.sessions.get(conn)
    }

    pub fn connection_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn connect(&mut self, conn: ConnectionId) {
        self.sessions
            .entry(conn.clone())
            .or_insert_with(|| ConnectionSession::new(conn));
    }

    /// Handle one raw text frame. Undecodable frames are dropped without reply.
    pub fn handle_frame(&mut self, conn: &ConnectionId, text: &str) -> Vec<Effect> {
        match ClientMessage::parse(text) {
            Ok(msg) => self.handle(conn, msg),
            Err(e) => {
                debug!(conn = %conn.short(), error = %e, "Discarding malformed message");
                Vec::new()
            }
        }
    }

    pub fn handle(&mut self, conn: &ConnectionId, msg: ClientMessage) -> Vec<Effect> {
        self.connect(conn.clone());
        let mut out = Vec::new();
        let result = match msg {
            ClientMessage::CreateRoom => self.create_room(conn, &mut out),
            ClientMessage::JoinRoom { room_id } => self.join_room(conn, &room_id, &mut out),
            ClientMessage::Ready => self.ready(conn, &mut out),
            ClientMessage::Score { score, level } => self.score(conn, score, level, &mut out),
            ClientMessage::Wrong => self.wrong(conn, &mut out),
            ClientMessage::Restart => self.restart(conn, &mut out),
        };
        if let Err(e) = result {
            debug!(conn = %conn.short(), error = %e, "Rejected request");
            out.push(Effect::Send {
                to: conn.clone(),
                message: ServerMessage::Error {
                    message: e.to_string(),
                },
            });
        }
        out
    }

    /// Tear down a connection's session and free its seat.
    pub fn disconnect(&mut self, conn: &ConnectionId) -> Vec<Effect> {
        let mut out = Vec::new();
        self.leave_room(conn, &mut out);
        self.sessions.remove(conn);
        out
    }

    /// The deferred countdown fired. Re-reads the room; stale timers do nothing.
    pub fn countdown_elapsed(&mut self, room_id: &RoomId, epoch: u64) -> Vec<Effect> {
        let mut out = Vec::new();
        let Some(room) = self.store.get_mut(room_id) else {
            debug!(room = %room_id, "Countdown fired for a deleted room");
            return out;
        };
        if !room.start_game(epoch) {
            debug!(room = %room_id, epoch, "Stale countdown ignored");
            return out;
        }
        info!(room = %room_id, "Game started");
        broadcast(&room.occupants(), ServerMessage::GameStart, &mut out);
        out
    }

    // -----------------------------------------------------------------------
    // Requests
    // -----------------------------------------------------------------------

    fn create_room(
        &mut self,
        conn: &ConnectionId,
        out: &mut Vec<Effect>,
    ) -> Result<(), RequestError> {
        self.leave_room(conn, out);

        let (room_id, room) = self.store.create();
        let slot = room.admit(conn.clone())?;
        self.bind(conn, room_id.clone(), slot);

        info!(room = %room_id, conn = %conn.short(), "Room created");
        unicast(
            conn,
            ServerMessage::RoomCreated {
                room_id,
                player_id: slot,
            },
            out,
        );
        Ok(())
    }

    fn join_room(
        &mut self,
        conn: &ConnectionId,
        requested: &str,
        out: &mut Vec<Effect>,
    ) -> Result<(), RequestError> {
        let room_id = RoomId::normalize(requested);
        if !is_valid_room_id(room_id.as_str()) {
            return Err(RequestError::RoomNotFound);
        }
        if self.bound_room(conn) == Some(&room_id) {
            return Err(RequestError::AlreadyInRoom);
        }

        // Validate before touching any state so a failed join has no effect.
        let room = self.store.get(&room_id).ok_or(RequestError::RoomNotFound)?;
        if room.is_full() {
            return Err(RequestError::RoomFull);
        }
        if room.game_started() {
            return Err(RequestError::GameAlreadyStarted);
        }

        self.leave_room(conn, out);

        let room = self
            .store
            .get_mut(&room_id)
            .ok_or(RequestError::RoomNotFound)?;
        let slot = room.admit(conn.clone())?;
        let notify = others(&room.occupants(), conn);
        self.bind(conn, room_id.clone(), slot);

        info!(room = %room_id, conn = %conn.short(), slot = %slot, "Player joined");
        unicast(
            conn,
            ServerMessage::RoomJoined {
                room_id,
                player_id: slot,
            },
            out,
        );
        broadcast(&notify, ServerMessage::PlayerJoined { player_id: slot }, out);
        Ok(())
    }

    fn ready(&mut self, conn: &ConnectionId, out: &mut Vec<Effect>) -> Result<(), RequestError> {
        let countdown = self.countdown;
        let (room_id, room) = self.current_room(conn)?;
        let slot = room.mark_ready(conn).ok_or(RequestError::NotInRoom)?;
        let everyone = room.occupants();
        broadcast(&everyone, ServerMessage::PlayerReady { player_id: slot }, out);

        if let Some(epoch) = room.begin_countdown() {
            info!(room = %room_id, epoch, "Countdown started");
            broadcast(&everyone, ServerMessage::CountdownStart, out);
            out.push(Effect::ScheduleCountdown {
                room_id,
                epoch,
                delay: countdown,
            });
        }
        Ok(())
    }

    fn score(
        &mut self,
        conn: &ConnectionId,
        score: u64,
        level: u32,
        out: &mut Vec<Effect>,
    ) -> Result<(), RequestError> {
        let (room_id, room) = self.current_room(conn)?;
        let Some(update) = room.record_score(conn, score, level) else {
            debug!(room = %room_id, conn = %conn.short(), "Score outside a running match ignored");
            return Ok(());
        };
        let everyone = room.occupants();
        broadcast(
            &others(&everyone, conn),
            ServerMessage::OpponentScore {
                player_id: update.slot,
                score: update.score,
                level: update.level,
            },
            out,
        );

        if let Some(over) = update.game_over {
            info!(room = %room_id, winner = %over.winner, "Game over");
            broadcast(
                &everyone,
                ServerMessage::GameOver {
                    winner: over.winner,
                    scores: over.scores,
                },
                out,
            );
        }
        Ok(())
    }

    fn wrong(&mut self, conn: &ConnectionId, out: &mut Vec<Effect>) -> Result<(), RequestError> {
        let (_, room) = self.current_room(conn)?;
        let slot = room.slot_of(conn).ok_or(RequestError::NotInRoom)?;
        broadcast(
            &others(&room.occupants(), conn),
            ServerMessage::OpponentWrong { player_id: slot },
            out,
        );
        Ok(())
    }

    fn restart(&mut self, conn: &ConnectionId, out: &mut Vec<Effect>) -> Result<(), RequestError> {
        let (room_id, room) = self.current_room(conn)?;
        room.reset();
        debug!(room = %room_id, "Room reset");
        broadcast(&room.occupants(), ServerMessage::GameReset, out);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn bound_room(&self, conn: &ConnectionId) -> Option<&RoomId> {
        self.sessions.get(conn)?.room.as_ref()
    }

    fn current_room(
        &mut self,
        conn: &ConnectionId,
    ) -> Result<(RoomId, &mut Room), RequestError> {
        let room_id = self.bound_room(conn).cloned().ok_or(RequestError::NotInRoom)?;
        let room = self
            .store
            .get_mut(&room_id)
            .ok_or(RequestError::NotInRoom)?;
        Ok((room_id, room))
    }

    fn bind(&mut self, conn: &ConnectionId, room_id: RoomId, slot: Slot) {
        self.sessions
            .entry(conn.clone())
            .or_insert_with(|| ConnectionSession::new(conn.clone()))
            .bind(room_id, slot);
    }

    /// Remove `conn` from its room, tell whoever remains, and delete the room
    /// once nobody is left.
    fn leave_room(&mut self, conn: &ConnectionId, out: &mut Vec<Effect>) {
        let Some(room_id) = self.sessions.get_mut(conn).and_then(|s| s.unbind()) else {
            return;
        };
        let Some(room) = self.store.get_mut(&room_id) else {
            return;
        };
        let Some(player) = room.remove_player(conn) else {
            return;
        };

        info!(room = %room_id, conn = %conn.short(), slot = %player.id, "Player left");
        broadcast(
            &room.occupants(),
            ServerMessage::PlayerLeft {
                player_id: player.id,
            },
            out,
        );
        if room.is_empty() {
            self.store.remove(&room_id);
            info!(room = %room_id, "Room deleted");
        }
    }
}

fn unicast(to: &ConnectionId, message: ServerMessage, out: &mut Vec<Effect>) {
    out.push(Effect::Send {
        to: to.clone(),
        message,
    });
}

fn broadcast(targets: &[ConnectionId], message: ServerMessage, out: &mut Vec<Effect>) {
    for to in targets {
        unicast(to, message.clone(), out);
    }
}

fn others(occupants: &[ConnectionId], sender: &ConnectionId) -> Vec<ConnectionId> {
    occupants.iter().filter(|c| *c != sender).cloned().collect()
}
