//! hunter-relay: room relay and match coordinator for two-player Pixel Hunter.
//!
//! Clients create or join a six-character room, ready up, and race to the
//! target level. The relay pairs them, runs the countdown, relays score and
//! miss events to the opponent, and declares the winner. It trusts whatever
//! scores the clients report.

pub mod config;
pub mod connection;
pub mod dispatcher;
pub mod errors;
pub mod game;
pub mod hub;
pub mod protocol;
pub mod room;
pub mod server;
pub mod session;

pub use config::{Args, RelayConfig};
pub use dispatcher::{Dispatcher, Effect, COUNTDOWN};
pub use errors::RequestError;
pub use game::Phase;
pub use hub::{Hub, HubHandle, HubStats};
pub use protocol::{ClientMessage, ServerMessage, Slot};
pub use room::{PlayerState, Room, RoomConfig, RoomId, RoomStore};
pub use server::{run, serve};
