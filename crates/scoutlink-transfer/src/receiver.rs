//! Receiving side: order-independent reassembly
//!
//! Frames for one transfer may arrive in any order, including chunks before
//! the header, and any frame may arrive more than once. A session completes
//! exactly when the header and every chunk index it declares are present; the
//! payload is then verified, emitted once, and the session discarded.
//!
//! The frame handler runs once per inbound network event with no concurrent
//! handlers for the same transfer, so the receiver takes `&mut self`.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use scoutlink_core::{payload_checksum, Clock, Frame, SystemClock, TransferError};

use crate::SESSION_TIMEOUT_MILLIS;

/// A fully reassembled payload
#[derive(Clone, Debug)]
pub struct CompletedTransfer {
    pub transfer_id: String,
    pub payload: Value,
}

/// Receiver-side accumulation state for one in-flight transfer
#[derive(Debug, Default)]
struct TransferSession {
    /// Declared totals; unknown until the header arrives
    total_chunks: Option<u32>,
    payload_len: Option<u64>,
    checksum: Option<String>,

    /// Received chunk data by index
    chunks: HashMap<u32, String>,

    /// Last frame arrival, for the inactivity timeout
    last_activity: u64,
}

impl TransferSession {
    fn is_complete(&self) -> bool {
        match self.total_chunks {
            Some(total) => self.chunks.len() as u32 >= total,
            None => false,
        }
    }

    /// Concatenate chunks in index order and verify integrity
    fn assemble(self, transfer_id: &str) -> Result<Value, TransferError> {
        let (Some(total), Some(expected_len), Some(expected_checksum)) =
            (self.total_chunks, self.payload_len, self.checksum)
        else {
            return Err(TransferError::CorruptTransfer {
                transfer_id: transfer_id.to_string(),
                detail: "assembled without a header".into(),
            });
        };

        let mut text = String::with_capacity(expected_len as usize);
        for index in 0..total {
            match self.chunks.get(&index) {
                Some(chunk) => text.push_str(chunk),
                None => {
                    return Err(TransferError::CorruptTransfer {
                        transfer_id: transfer_id.to_string(),
                        detail: format!("missing chunk {index}"),
                    });
                }
            }
        }

        if text.len() as u64 != expected_len {
            return Err(TransferError::CorruptTransfer {
                transfer_id: transfer_id.to_string(),
                detail: format!("length {} != declared {}", text.len(), expected_len),
            });
        }

        let actual = payload_checksum(text.as_bytes());
        if actual != expected_checksum {
            return Err(TransferError::CorruptTransfer {
                transfer_id: transfer_id.to_string(),
                detail: "checksum mismatch".into(),
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

/// Reassembles chunked transfers arriving on one channel
pub struct TransferReceiver {
    sessions: HashMap<String, TransferSession>,
    clock: Arc<dyn Clock>,
    timeout_millis: u64,
}

impl TransferReceiver {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: HashMap::new(),
            clock,
            timeout_millis: SESSION_TIMEOUT_MILLIS,
        }
    }

    pub fn with_timeout(mut self, timeout_millis: u64) -> Self {
        self.timeout_millis = timeout_millis;
        self
    }

    /// Handle one raw inbound message. Unparseable frames are dropped and
    /// logged; they never fail a session.
    pub fn on_message(&mut self, text: &str) -> Result<Option<CompletedTransfer>, TransferError> {
        match Frame::from_json(text) {
            Ok(frame) => self.on_frame(frame),
            Err(e) => {
                let err = TransferError::MalformedFrame(e.to_string());
                warn!("Dropping frame: {}", err);
                Ok(None)
            }
        }
    }

    /// Handle one decoded frame. Returns the reconstructed payload when this
    /// frame completes its transfer, `None` otherwise.
    pub fn on_frame(&mut self, frame: Frame) -> Result<Option<CompletedTransfer>, TransferError> {
        let now = self.clock.now_millis();

        match frame {
            Frame::Header {
                transfer_id,
                total_chunks,
                payload_len,
                checksum,
            } => {
                let session = self.sessions.entry(transfer_id.clone()).or_default();
                session.last_activity = now;

                // A re-sent header is a no-op; the first one wins
                if session.total_chunks.is_none() {
                    session.total_chunks = Some(total_chunks);
                    session.payload_len = Some(payload_len);
                    session.checksum = Some(checksum);
                    // Chunks recorded before the header may now be out of range
                    session.chunks.retain(|index, _| *index < total_chunks);
                }

                self.try_complete(&transfer_id)
            }

            Frame::Chunk {
                transfer_id,
                index,
                data,
            } => {
                let session = self.sessions.entry(transfer_id.clone()).or_default();
                session.last_activity = now;

                if let Some(total) = session.total_chunks {
                    if index >= total {
                        let err = TransferError::MalformedFrame(format!(
                            "chunk {index} of transfer {transfer_id} out of declared range {total}"
                        ));
                        warn!("Dropping frame: {}", err);
                        return Ok(None);
                    }
                }

                // Duplicate delivery is a no-op, not an error
                session.chunks.entry(index).or_insert(data);

                self.try_complete(&transfer_id)
            }
        }
    }

    /// Drop sessions idle past the timeout and report each as a failed
    /// transfer. A later frame with a dropped id starts a fresh session.
    pub fn sweep_stale(&mut self) -> Vec<TransferError> {
        let now = self.clock.now_millis();
        let timeout = self.timeout_millis;

        let stale: Vec<String> = self
            .sessions
            .iter()
            .filter(|(_, session)| now.saturating_sub(session.last_activity) > timeout)
            .map(|(id, _)| id.clone())
            .collect();

        let mut failed = Vec::with_capacity(stale.len());
        for id in stale {
            self.sessions.remove(&id);
            let err = TransferError::Timeout { transfer_id: id };
            warn!("{}", err);
            failed.push(err);
        }

        failed
    }

    /// Number of incomplete sessions held in memory
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn try_complete(
        &mut self,
        transfer_id: &str,
    ) -> Result<Option<CompletedTransfer>, TransferError> {
        let complete = self
            .sessions
            .get(transfer_id)
            .is_some_and(|session| session.is_complete());
        if !complete {
            return Ok(None);
        }

        // Session leaves the map either way: emitted once, or discarded as
        // corrupt rather than handed to application code.
        let Some(session) = self.sessions.remove(transfer_id) else {
            return Ok(None);
        };

        let payload = session.assemble(transfer_id)?;
        debug!("Transfer {} complete", transfer_id);

        Ok(Some(CompletedTransfer {
            transfer_id: transfer_id.to_string(),
            payload,
        }))
    }
}

impl Default for TransferReceiver {
    fn default() -> Self {
        Self::new()
    }
}
