//! Scoutlink Signaling Broker
//!
//! In-memory relay that lets an ad-hoc "lead" device and its "scout" devices
//! exchange connection-setup messages (offer/answer/ICE) before a direct peer
//! channel exists. Peers short-poll a per-room mailbox instead of holding a
//! persistent connection.
//!
//! # Protocol
//!
//! 1. The lead joins a room under an application-chosen room id
//! 2. Scouts join the same room
//! 3. Peers post offer/answer/ice-candidate messages and poll for replies
//! 4. Polling a message marks it delivered to that peer (pull = ack)
//! 5. Once direct channels are up, the broker leaves the data path
//!
//! Rooms are dropped unconditionally once their age exceeds the TTL. The TTL
//! is deliberately NOT refreshed by activity; see DESIGN.md for the caveat.

pub mod broker;
pub mod messages;
pub mod room;
pub mod server;
pub mod store;

pub use broker::{PollOutcome, PostOutcome, SignalBroker};
pub use messages::{BrokerError, PeerRole, RoomSummary, ScoutInfo, SignalKind, SignalMessage};
pub use room::Room;
pub use server::SignalServer;
pub use store::{MemoryStore, RoomStore};

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 8080;

/// Room time-to-live in seconds (30 minutes, counted from creation)
pub const ROOM_TTL_SECS: u64 = 30 * 60;

/// Interval between TTL sweeps, same as the TTL itself
pub const SWEEP_INTERVAL_SECS: u64 = ROOM_TTL_SECS;
