//! The hub task: sole owner of the dispatcher, and therefore of every room.
//!
//! Connections and countdown timers talk to it over one mpsc channel, so
//! each frame, lifecycle event, and timer firing is handled to completion
//! before the next. No lock guards the room table.

use std::collections::HashMap;
use std::time::Duration;

use hunter_common::ConnectionId;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::dispatcher::{Dispatcher, Effect};
use crate::protocol::ServerMessage;
use crate::room::RoomId;

/// Capacity of the hub inbox and of each connection's outbound queue.
pub const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug)]
pub enum HubEvent {
    Connected {
        conn: ConnectionId,
        tx: mpsc::Sender<String>,
    },
    Frame {
        conn: ConnectionId,
        text: String,
    },
    Disconnected {
        conn: ConnectionId,
    },
    CountdownElapsed {
        room_id: RoomId,
        epoch: u64,
    },
    Stats {
        reply: oneshot::Sender<HubStats>,
    },
    Shutdown,
}

/// Outcome of handing one message to a peer's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// Peer unknown or its connection task has exited.
    Departed,
    /// Peer is alive but not draining its queue.
    Stalled,
    Unencodable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubStats {
    pub rooms: usize,
    pub connections: usize,
}

/// Cloneable front door to the hub task.
#[derive(Clone)]
pub struct HubHandle {
    tx: mpsc::Sender<HubEvent>,
}

impl HubHandle {
    /// Register a connection's outbound queue. Returns false if the hub is gone.
    pub async fn connected(&self, conn: ConnectionId, tx: mpsc::Sender<String>) -> bool {
        self.tx.send(HubEvent::Connected { conn, tx }).await.is_ok()
    }

    pub async fn frame(&self, conn: ConnectionId, text: String) -> bool {
        self.tx.send(HubEvent::Frame { conn, text }).await.is_ok()
    }

    pub async fn disconnected(&self, conn: ConnectionId) {
        let _ = self.tx.send(HubEvent::Disconnected { conn }).await;
    }

    pub async fn stats(&self) -> Option<HubStats> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(HubEvent::Stats { reply }).await.ok()?;
        rx.await.ok()
    }

    pub async fn shutdown(&self) {
        let _ = self.tx.send(HubEvent::Shutdown).await;
    }
}

pub struct Hub {
    dispatcher: Dispatcher,
    peers: HashMap<ConnectionId, mpsc::Sender<String>>,
    rx: mpsc::Receiver<HubEvent>,
    // Weak so that pending timers alone do not keep the hub alive.
    timer_tx: mpsc::WeakSender<HubEvent>,
}

impl Hub {
    pub fn new(dispatcher: Dispatcher) -> (Self, HubHandle) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let hub = Self {
            dispatcher,
            peers: HashMap::new(),
            rx,
            timer_tx: tx.downgrade(),
        };
        (hub, HubHandle { tx })
    }

    /// Spawn the hub onto the current runtime.
    pub fn spawn(dispatcher: Dispatcher) -> (HubHandle, JoinHandle<()>) {
        let (hub, handle) = Self::new(dispatcher);
        let task = tokio::spawn(hub.run());
        (handle, task)
    }

    pub async fn run(mut self) {
        while let Some(event) = self.rx.recv().await {
            let effects = match event {
                HubEvent::Connected { conn, tx } => {
                    self.dispatcher.connect(conn.clone());
                    self.peers.insert(conn, tx);
                    continue;
                }
                HubEvent::Frame { conn, text } => self.dispatcher.handle_frame(&conn, &text),
                HubEvent::Disconnected { conn } => {
                    self.peers.remove(&conn);
                    self.dispatcher.disconnect(&conn)
                }
                HubEvent::CountdownElapsed { room_id, epoch } => {
                    self.dispatcher.countdown_elapsed(&room_id, epoch)
                }
                HubEvent::Stats { reply } => {
                    let _ = reply.send(HubStats {
                        rooms: self.dispatcher.rooms().len(),
                        connections: self.dispatcher.connection_count(),
                    });
                    continue;
                }
                HubEvent::Shutdown => break,
            };
            self.apply(effects);
        }
        info!(rooms = self.dispatcher.rooms().len(), "Hub stopped");
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Send { to, message } => {
                    self.deliver(&to, &message);
                }
                Effect::ScheduleCountdown {
                    room_id,
                    epoch,
                    delay,
                } => self.schedule_countdown(room_id, epoch, delay),
            }
        }
    }

    /// Best effort. Departed peers are dropped quietly; a live peer with a
    /// full queue loses the message and that is logged at `warn`.
    fn deliver(&self, to: &ConnectionId, message: &ServerMessage) -> Delivery {
        let Some(peer) = self.peers.get(to) else {
            debug!(conn = %to.short(), "Dropping message for departed peer");
            return Delivery::Departed;
        };
        let json = match message.to_json() {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to encode outbound message");
                return Delivery::Unencodable;
            }
        };
        match peer.try_send(json) {
            Ok(()) => Delivery::Sent,
            Err(TrySendError::Closed(_)) => {
                debug!(conn = %to.short(), "Peer queue closed, message dropped");
                Delivery::Departed
            }
            Err(TrySendError::Full(_)) => {
                warn!(conn = %to.short(), "Peer queue full, message lost to a live client");
                Delivery::Stalled
            }
        }
    }

    fn schedule_countdown(&self, room_id: RoomId, epoch: u64, delay: Duration) {
        let timer_tx = self.timer_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(tx) = timer_tx.upgrade() {
                let _ = tx.send(HubEvent::CountdownElapsed { room_id, epoch }).await;
            }
        });
    }
}
