//! Error types for the chunked transfer protocol

use thiserror::Error;

/// Transfer-level errors
///
/// Each error is scoped to a single transfer; a failed transfer never affects
/// other in-flight transfers sharing the same channel.
#[derive(Error, Debug, Clone)]
pub enum TransferError {
    /// The underlying channel closed during a send. No automatic resend; the
    /// layer above decides whether to retry with a fresh user action.
    #[error("transport closed during send")]
    TransportClosed,

    /// The reassembled payload failed its integrity check. The assembled data
    /// is discarded, never handed to application code.
    #[error("corrupt transfer {transfer_id}: {detail}")]
    CorruptTransfer { transfer_id: String, detail: String },

    /// A single frame violated the wire contract. Dropped at the frame level,
    /// not fatal to the session.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// An incomplete session exceeded its inactivity timeout
    #[error("transfer {transfer_id} timed out before completion")]
    Timeout { transfer_id: String },

    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for TransferError {
    fn from(e: serde_json::Error) -> Self {
        TransferError::Serialization(e.to_string())
    }
}
