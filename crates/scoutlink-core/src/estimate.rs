//! Transfer size estimation and delivery profiles
//!
//! The estimator is a pure function: callers feed it a serialized payload size
//! and a profile and get back the number of discrete sends the transfer will
//! take. The UI uses it for progress display, so the estimate must be
//! monotonic in payload size and must not depend on the clock or RNG.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Chunk size for the fast profile (12 KB)
pub const FAST_CHUNK_SIZE: usize = 12 * 1024;

/// Chunk size for the reliable profile (4 KB)
pub const RELIABLE_CHUNK_SIZE: usize = 4 * 1024;

/// Inter-chunk pacing delay for the reliable profile
pub const RELIABLE_CHUNK_DELAY: Duration = Duration::from_millis(50);

/// Delivery tuning selection
///
/// A profile affects chunk size and pacing only, never correctness. The
/// reliable profile favors smaller chunks and paced emission for higher
/// delivery success on congested channels, at the cost of more packets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    Fast,
    Reliable,
}

// Chunk data travels inside a JSON envelope; every profile must leave
// headroom under the channel's message size limit.
const _: () = assert!(FAST_CHUNK_SIZE + FRAME_ENVELOPE_HEADROOM <= crate::MAX_FRAME_SIZE);
const _: () = assert!(RELIABLE_CHUNK_SIZE + FRAME_ENVELOPE_HEADROOM <= crate::MAX_FRAME_SIZE);

/// Budget reserved for the frame's own JSON fields around the chunk data
const FRAME_ENVELOPE_HEADROOM: usize = 512;

impl Profile {
    /// Chunk size in bytes for this profile
    pub const fn chunk_size(self) -> usize {
        match self {
            Profile::Fast => FAST_CHUNK_SIZE,
            Profile::Reliable => RELIABLE_CHUNK_SIZE,
        }
    }

    /// Delay between chunk sends, if this profile paces emission
    pub const fn inter_chunk_delay(self) -> Option<Duration> {
        match self {
            Profile::Fast => None,
            Profile::Reliable => Some(RELIABLE_CHUNK_DELAY),
        }
    }
}

/// Result of a transfer estimate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferEstimate {
    /// Number of discrete sends the transfer will take (header + chunks)
    pub target_packets: u32,
    /// Chunk size the sender will use
    pub chunk_size: usize,
}

/// Estimate how many discrete sends a payload of `payload_len` bytes needs.
///
/// For a fixed profile, `target_packets` is non-decreasing in `payload_len`.
pub fn estimate_transfer(payload_len: usize, profile: Profile) -> TransferEstimate {
    let chunk_size = profile.chunk_size();

    // At least one chunk frame even for an empty payload, plus the header.
    let data_packets = payload_len.div_ceil(chunk_size).max(1);

    TransferEstimate {
        target_packets: (data_packets + 1) as u32,
        chunk_size,
    }
}
