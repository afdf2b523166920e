//! Transport seam
//!
//! The transfer protocol only needs discrete text messages with a practical
//! maximum size and a way to observe channel state. The surrounding app wires
//! this to a peer data channel; tests wire it to an in-memory mock.

use async_trait::async_trait;

use scoutlink_core::TransferError;

/// A discrete-message channel to one peer
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one text message. Errors map to [`TransferError::TransportClosed`]
    /// when the channel is gone.
    async fn send_text(&self, text: &str) -> Result<(), TransferError>;

    /// Whether the channel is currently open
    fn is_open(&self) -> bool;
}
