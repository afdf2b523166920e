//! Sending side: serialize, chunk, emit
//!
//! A send is one header frame followed by one frame per chunk. No per-chunk
//! acknowledgement: completeness detection lives entirely on the receiver. If
//! the channel closes mid-send the transfer is abandoned and reported as
//! failed; the layer above decides whether a fresh user action retries it.

use serde_json::Value;
use tracing::debug;

use scoutlink_core::{payload_checksum, split_chunks, Frame, Profile, TransferError};

use crate::transport::Transport;

/// What a completed send looked like, for progress bookkeeping
#[derive(Clone, Debug)]
pub struct SendReport {
    pub transfer_id: String,
    pub total_chunks: u32,
    pub payload_len: u64,
}

/// Serialize `payload` and push it through `transport` as a chunked transfer.
///
/// The reliable profile paces chunk emission to avoid overwhelming the
/// transport's internal buffering; this is the only suspension in the data
/// path.
pub async fn send_payload(
    payload: &Value,
    transport: &dyn Transport,
    profile: Profile,
) -> Result<SendReport, TransferError> {
    let text = serde_json::to_string(payload)?;
    let checksum = payload_checksum(text.as_bytes());
    let transfer_id = generate_transfer_id();

    let chunks = split_chunks(&text, profile.chunk_size());
    let total_chunks = chunks.len() as u32;

    debug!(
        "Sending transfer {} ({} bytes, {} chunks, {:?})",
        transfer_id,
        text.len(),
        total_chunks,
        profile
    );

    let header = Frame::Header {
        transfer_id: transfer_id.clone(),
        total_chunks,
        payload_len: text.len() as u64,
        checksum,
    };
    send_frame(transport, &header).await?;

    for (index, data) in chunks.iter().enumerate() {
        if index > 0 {
            if let Some(delay) = profile.inter_chunk_delay() {
                tokio::time::sleep(delay).await;
            }
        }

        let frame = Frame::Chunk {
            transfer_id: transfer_id.clone(),
            index: index as u32,
            data: (*data).to_string(),
        };
        send_frame(transport, &frame).await?;
    }

    Ok(SendReport {
        transfer_id,
        total_chunks,
        payload_len: text.len() as u64,
    })
}

async fn send_frame(transport: &dyn Transport, frame: &Frame) -> Result<(), TransferError> {
    if !transport.is_open() {
        return Err(TransferError::TransportClosed);
    }
    transport.send_text(&frame.to_json()?).await
}

fn generate_transfer_id() -> String {
    let mut bytes = [0u8; 8];
    getrandom::fill(&mut bytes).expect("RNG failed");
    hex::encode(bytes)
}
