//! Scoutlink Core - Shared protocol definitions for the peer sync layer
//!
//! This crate contains the wire frames, the transfer estimator, the error
//! taxonomy, and the clock abstraction used by both the signaling broker and
//! the chunked transfer protocol. It has no dependencies on networking code.

pub mod clock;
pub mod error;
pub mod estimate;
pub mod frame;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::TransferError;
pub use estimate::{estimate_transfer, Profile, TransferEstimate};
pub use frame::{payload_checksum, split_chunks, Frame};

/// Practical maximum size of a single data channel message (16 KB).
/// Every profile's chunk size must leave headroom under this for the
/// JSON frame envelope.
pub const MAX_FRAME_SIZE: usize = 16 * 1024;
