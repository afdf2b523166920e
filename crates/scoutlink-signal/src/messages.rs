//! Signaling protocol messages

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Message kinds accepted by the broker
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
    Join,
    Leave,
    Ping,
}

/// Device role within a room
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeerRole {
    /// Aggregates data from scouts; at most one per room
    Lead,
    /// Submits data to, or receives data from, the lead
    Scout,
}

/// A signaling message as posted by a peer
///
/// `roomId` and `peerId` are required for every kind except ping; the broker
/// validates that, not the deserializer, so a bad request can be echoed back.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalMessage {
    #[serde(rename = "type")]
    pub kind: SignalKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<PeerRole>,

    /// When present, only this peer may ever receive the message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_peer_id: Option<String>,

    /// Opaque application data (session description, ICE candidate, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Roster entry exposed in poll responses
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScoutInfo {
    pub id: String,
    pub name: String,
}

/// Room state summary returned from both broker operations
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: String,
    pub lead_connected: bool,
    pub scout_count: usize,

    /// Present on poll responses only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scouts: Option<Vec<ScoutInfo>>,
}

impl RoomSummary {
    /// Synthetic summary for a room that does not exist yet. Polling an
    /// unknown room is not an error; it looks like polling an empty room.
    pub fn not_found(room_id: &str) -> Self {
        Self {
            id: room_id.to_string(),
            lead_connected: false,
            scout_count: 0,
            scouts: Some(Vec::new()),
        }
    }
}

/// Broker errors
#[derive(Debug, Error)]
pub enum BrokerError {
    /// Required identifying fields missing on a non-ping call. Reported
    /// synchronously, never retried automatically.
    #[error("missing roomId or peerId")]
    InvalidRequest { received: Value },
}
