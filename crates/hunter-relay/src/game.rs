//! Per-room match state machine: readiness, countdown, start, scoring, reset.
//!
//! ```text
//! Waiting ──all ready──▶ CountdownPending ──timer──▶ InProgress ──level > target──▶ Finished
//!    ▲                                                                                 │
//!    └──────────────────────────────── restart ◀───────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use hunter_common::ConnectionId;

use crate::protocol::Slot;
use crate::room::Room;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Waiting,
    /// `epoch` identifies the timer that may promote this countdown.
    CountdownPending { epoch: u64 },
    InProgress,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameOver {
    pub winner: Slot,
    pub scores: BTreeMap<Slot, u64>,
}

/// Result of accepting a score report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreUpdate {
    pub slot: Slot,
    pub score: u64,
    pub level: u32,
    pub game_over: Option<GameOver>,
}

impl Room {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn game_started(&self) -> bool {
        self.phase == Phase::InProgress
    }

    fn all_ready(&self) -> bool {
        self.players.len() == Room::CAPACITY && self.players.values().all(|p| p.ready)
    }

    /// Mark a seated connection ready. Returns its slot.
    pub fn mark_ready(&mut self, conn: &ConnectionId) -> Option<Slot> {
        let player = self.players.get_mut(conn)?;
        player.ready = true;
        Some(player.id)
    }

    /// Enter `CountdownPending` if both seats are taken and ready. Returns the
    /// epoch the deferred start must present.
    pub fn begin_countdown(&mut self) -> Option<u64> {
        if self.phase != Phase::Waiting || !self.all_ready() {
            return None;
        }
        self.countdown_epoch += 1;
        self.phase = Phase::CountdownPending {
            epoch: self.countdown_epoch,
        };
        Some(self.countdown_epoch)
    }

    /// Promote a pending countdown. Stale timers (restart, departure, or a
    /// newer countdown since scheduling) are rejected.
    pub fn start_game(&mut self, epoch: u64) -> bool {
        let pending = self.phase == Phase::CountdownPending { epoch };
        if !pending || self.players.len() != Room::CAPACITY {
            return false;
        }
        self.phase = Phase::InProgress;
        true
    }

    /// Apply a client-reported score. Ignored unless a match is running.
    pub fn record_score(
        &mut self,
        conn: &ConnectionId,
        score: u64,
        level: u32,
    ) -> Option<ScoreUpdate> {
        if !self.game_started() {
            return None;
        }
        let target = self.config().target_level;
        let player = self.players.get_mut(conn)?;
        player.score = score;
        player.level = level;
        let slot = player.id;

        let mut game_over = None;
        if level > target {
            self.phase = Phase::Finished;
            game_over = Some(GameOver {
                winner: slot,
                scores: self.players.values().map(|p| (p.id, p.score)).collect(),
            });
        }

        Some(ScoreUpdate {
            slot,
            score,
            level,
            game_over,
        })
    }

    /// Back to `Waiting` with every player unready at score 0, level 2.
    pub fn reset(&mut self) {
        for player in self.players.values_mut() {
            player.reset();
        }
        self.phase = Phase::Waiting;
    }

    pub(crate) fn abandon_match(&mut self) {
        self.phase = Phase::Waiting;
    }
}
