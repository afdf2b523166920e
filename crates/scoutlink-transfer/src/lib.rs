//! Scoutlink Chunked Transfer Protocol
//!
//! Moves JSON payloads of arbitrary size over a transport whose individual
//! message size is bounded and whose delivery order is not guaranteed (a peer
//! data channel). The sender splits the serialized payload into indexed
//! frames; the receiver reassembles them in any arrival order, tolerates
//! duplicates, and times out sessions that never complete.
//!
//! The layer is payload-agnostic: it accepts and emits opaque JSON values.
//! Schema validation of a reconstructed payload belongs to the application.

pub mod receiver;
pub mod sender;
pub mod transport;

pub use receiver::{CompletedTransfer, TransferReceiver};
pub use sender::{send_payload, SendReport};
pub use transport::Transport;

/// Inactivity timeout for incomplete receive sessions (30 seconds)
pub const SESSION_TIMEOUT_MILLIS: u64 = 30_000;
