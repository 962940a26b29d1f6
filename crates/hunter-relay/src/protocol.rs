//! Wire protocol: one JSON document per text frame, discriminated by `type`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::room::RoomId;

/// Fixed seat label inside a room, assigned in join order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Slot {
    A,
    B,
}

impl Slot {
    pub const ALL: [Slot; 2] = [Slot::A, Slot::B];

    pub fn other(self) -> Slot {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::A => f.write_str("A"),
            Slot::B => f.write_str("B"),
        }
    }
}

/// Messages clients send to the relay.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "create_room")]
    CreateRoom,

    #[serde(rename = "join_room")]
    JoinRoom {
        #[serde(rename = "roomId")]
        room_id: String,
    },

    #[serde(rename = "ready")]
    Ready,

    #[serde(rename = "score")]
    Score { score: u64, level: u32 },

    #[serde(rename = "wrong")]
    Wrong,

    #[serde(rename = "restart")]
    Restart,
}

impl ClientMessage {
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// Messages the relay sends back to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "room_created", rename_all = "camelCase")]
    RoomCreated { room_id: RoomId, player_id: Slot },

    #[serde(rename = "room_joined", rename_all = "camelCase")]
    RoomJoined { room_id: RoomId, player_id: Slot },

    #[serde(rename = "player_joined", rename_all = "camelCase")]
    PlayerJoined { player_id: Slot },

    #[serde(rename = "player_ready", rename_all = "camelCase")]
    PlayerReady { player_id: Slot },

    #[serde(rename = "countdown_start")]
    CountdownStart,

    #[serde(rename = "game_start")]
    GameStart,

    #[serde(rename = "opponent_score", rename_all = "camelCase")]
    OpponentScore {
        player_id: Slot,
        score: u64,
        level: u32,
    },

    #[serde(rename = "opponent_wrong", rename_all = "camelCase")]
    OpponentWrong { player_id: Slot },

    #[serde(rename = "game_over")]
    GameOver {
        winner: Slot,
        scores: BTreeMap<Slot, u64>,
    },

    #[serde(rename = "game_reset")]
    GameReset,

    #[serde(rename = "player_left", rename_all = "camelCase")]
    PlayerLeft { player_id: Slot },

    #[serde(rename = "error")]
    Error { message: String },
}

impl ServerMessage {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
