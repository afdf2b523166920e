//! Chunked transfer wire format
//!
//! A transfer is one header frame followed by one frame per chunk. Every frame
//! is self-describing (transfer id + index) so the receiver can reassemble
//! regardless of arrival order. Frames travel as JSON text messages over
//! whatever the direct peer channel natively supports.

use serde::{Deserialize, Serialize};

/// One discrete message unit of the chunked transfer protocol
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frame {
    /// Announces a transfer: totals and integrity marker
    Header {
        transfer_id: String,
        total_chunks: u32,
        /// Byte length of the full serialized payload
        payload_len: u64,
        /// Lowercase hex BLAKE3 hash of the serialized payload bytes
        checksum: String,
    },

    /// One slice of the serialized payload
    Chunk {
        transfer_id: String,
        index: u32,
        data: String,
    },
}

impl Frame {
    /// Transfer this frame belongs to
    pub fn transfer_id(&self) -> &str {
        match self {
            Frame::Header { transfer_id, .. } => transfer_id,
            Frame::Chunk { transfer_id, .. } => transfer_id,
        }
    }

    /// Parse from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Integrity marker for a serialized payload
pub fn payload_checksum(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Split a serialized payload into chunks of at most `chunk_size` bytes.
///
/// Cuts are moved back to the nearest char boundary so every chunk stays
/// valid UTF-8. Always yields at least one chunk. A zero `chunk_size` is
/// treated as one byte.
pub fn split_chunks(payload: &str, chunk_size: usize) -> Vec<&str> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::with_capacity(payload.len() / chunk_size + 1);
    let mut rest = payload;

    while rest.len() > chunk_size {
        let mut cut = chunk_size;
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        let (head, tail) = rest.split_at(cut);
        chunks.push(head);
        rest = tail;
    }

    chunks.push(rest);
    chunks
}
