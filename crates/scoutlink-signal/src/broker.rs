//! Broker operations: post and poll
//!
//! The broker is the sole owner and mutator of room state. Both entry points
//! execute atomically with respect to other calls on the same room (the store
//! serializes per-room access), so no message append can interleave with a
//! poll on the same mailbox.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::json;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use scoutlink_core::{Clock, SystemClock};

use crate::messages::{BrokerError, RoomSummary, SignalKind, SignalMessage};
use crate::store::{MemoryStore, RoomStore};

/// Result of posting a message
#[derive(Clone, Debug)]
pub enum PostOutcome {
    /// Ping short-circuit; room state untouched
    Pong,
    /// Message accepted; summary has no scout roster
    Posted(RoomSummary),
}

/// Result of polling a room
#[derive(Clone, Debug, Serialize)]
pub struct PollOutcome {
    pub messages: Vec<SignalMessage>,
    pub room: RoomSummary,
}

/// Signaling broker over an injectable room store
pub struct SignalBroker<S: RoomStore = MemoryStore> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl SignalBroker<MemoryStore> {
    /// Broker backed by a fresh in-memory store on the system clock
    pub fn in_memory() -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self {
            store: MemoryStore::new(clock.clone()),
            clock,
        }
    }
}

impl<S: RoomStore> SignalBroker<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Accept a signaling message.
    ///
    /// Ping returns immediately without touching room state. Everything else
    /// requires `roomId` and `peerId` and creates the room on first
    /// reference. Join/leave maintain the roster; offer/answer/ice-candidate
    /// are queued verbatim for polling peers.
    pub fn post_message(&self, message: SignalMessage) -> Result<PostOutcome, BrokerError> {
        if message.kind == SignalKind::Ping {
            return Ok(PostOutcome::Pong);
        }

        let room_id = match (&message.room_id, &message.peer_id) {
            (Some(room_id), Some(_)) => room_id.clone(),
            _ => {
                return Err(BrokerError::InvalidRequest {
                    received: json!({
                        "roomId": message.room_id,
                        "peerId": message.peer_id,
                        "type": message.kind,
                        "role": message.role,
                    }),
                });
            }
        };

        let now = self.clock.now_millis();
        let summary = self.store.with_room_or_create(&room_id, |room| {
            match message.kind {
                SignalKind::Join => {
                    room.record_join(&message, now);
                    info!(
                        "Peer {} joined room {} as {:?}",
                        message.peer_id.as_deref().unwrap_or(""),
                        room_id,
                        message.role
                    );
                }
                SignalKind::Leave => {
                    room.record_leave(&message);
                    info!(
                        "Peer {} left room {}",
                        message.peer_id.as_deref().unwrap_or(""),
                        room_id
                    );
                }
                SignalKind::Offer | SignalKind::Answer | SignalKind::IceCandidate => {
                    room.push_message(message.clone());
                }
                SignalKind::Ping => unreachable!("ping short-circuits above"),
            }
            room.summary(false)
        });

        Ok(PostOutcome::Posted(summary))
    }

    /// Fetch pending messages for `peer_id` and mark them delivered.
    ///
    /// An unknown room is not an error: the response is shaped exactly like
    /// polling an empty room, so a scout polling before the lead has created
    /// the room behaves identically.
    pub fn poll_messages(&self, room_id: &str, peer_id: &str) -> PollOutcome {
        let outcome = self.store.with_room(room_id, |room| {
            let messages = room.drain_for(peer_id);
            PollOutcome {
                messages,
                room: room.summary(true),
            }
        });

        match outcome {
            Some(outcome) => {
                if !outcome.messages.is_empty() {
                    debug!(
                        "Delivered {} message(s) to {} in room {}",
                        outcome.messages.len(),
                        peer_id,
                        room_id
                    );
                }
                outcome
            }
            None => PollOutcome {
                messages: Vec::new(),
                room: RoomSummary::not_found(room_id),
            },
        }
    }

    /// Drop rooms older than `ttl`; returns the dropped room ids
    pub fn sweep(&self, ttl: Duration) -> Vec<String> {
        let removed = self.store.sweep(ttl);
        for id in &removed {
            info!("Cleaned up room: {}", id);
        }
        removed
    }

    /// Number of live rooms (for monitoring)
    pub fn room_count(&self) -> usize {
        self.store.room_count()
    }
}

impl<S: RoomStore + 'static> SignalBroker<S> {
    /// Start the periodic TTL sweep as a task owned by the caller.
    ///
    /// Abort the returned handle to stop sweeping at service shutdown.
    pub fn spawn_sweeper(self: Arc<Self>, interval: Duration, ttl: Duration) -> JoinHandle<()> {
        let broker = self;
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(interval);
            // The first tick completes immediately; skip it so the first
            // sweep happens one full interval after startup.
            tick.tick().await;
            loop {
                tick.tick().await;
                broker.sweep(ttl);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::PeerRole;
    use scoutlink_core::ManualClock;

    fn test_broker() -> (SignalBroker<MemoryStore>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(0));
        let store = MemoryStore::new(clock.clone());
        (SignalBroker::new(store, clock.clone()), clock)
    }

    fn message(kind: SignalKind, room: &str, peer: &str) -> SignalMessage {
        SignalMessage {
            kind,
            room_id: Some(room.into()),
            peer_id: Some(peer.into()),
            peer_name: None,
            role: None,
            target_peer_id: None,
            data: None,
        }
    }

    fn join(room: &str, peer: &str, role: PeerRole) -> SignalMessage {
        SignalMessage {
            role: Some(role),
            ..message(SignalKind::Join, room, peer)
        }
    }

    #[test]
    fn test_ping_short_circuits() {
        let (broker, _) = test_broker();
        let ping = SignalMessage {
            kind: SignalKind::Ping,
            room_id: None,
            peer_id: None,
            peer_name: None,
            role: None,
            target_peer_id: None,
            data: None,
        };

        assert!(matches!(broker.post_message(ping), Ok(PostOutcome::Pong)));
        assert_eq!(broker.room_count(), 0);
    }

    #[test]
    fn test_missing_ids_rejected() {
        let (broker, _) = test_broker();
        let mut bad = message(SignalKind::Offer, "R1", "p1");
        bad.peer_id = None;

        assert!(matches!(
            broker.post_message(bad),
            Err(BrokerError::InvalidRequest { .. })
        ));
        assert_eq!(broker.room_count(), 0);
    }

    #[test]
    fn test_unknown_room_poll_is_soft() {
        let (broker, _) = test_broker();

        let outcome = broker.poll_messages("nope", "p1");
        assert!(outcome.messages.is_empty());
        assert_eq!(outcome.room.id, "nope");
        assert!(!outcome.room.lead_connected);
        assert_eq!(outcome.room.scout_count, 0);
        assert!(outcome.room.scouts.is_some_and(|s| s.is_empty()));
    }

    #[test]
    fn test_at_most_once_per_peer() {
        let (broker, _) = test_broker();
        broker.post_message(join("R1", "lead1", PeerRole::Lead)).unwrap();
        broker.post_message(join("R1", "s1", PeerRole::Scout)).unwrap();

        let first = broker.poll_messages("R1", "lead1");
        assert_eq!(first.messages.len(), 1);

        let second = broker.poll_messages("R1", "lead1");
        assert!(second.messages.is_empty());
    }

    #[test]
    fn test_no_self_delivery() {
        let (broker, _) = test_broker();
        broker.post_message(join("R1", "s1", PeerRole::Scout)).unwrap();

        assert!(broker.poll_messages("R1", "s1").messages.is_empty());
    }

    #[test]
    fn test_targeted_delivery() {
        let (broker, _) = test_broker();
        let mut offer = message(SignalKind::Offer, "R1", "s1");
        offer.target_peer_id = Some("lead1".into());
        broker.post_message(offer).unwrap();

        assert!(broker.poll_messages("R1", "s2").messages.is_empty());
        assert_eq!(broker.poll_messages("R1", "lead1").messages.len(), 1);
    }

    #[test]
    fn test_end_to_end_room_scenario() {
        let (broker, _) = test_broker();

        // Lead creates room R1; scout s1 joins
        broker.post_message(join("R1", "lead1", PeerRole::Lead)).unwrap();
        match broker.post_message(join("R1", "s1", PeerRole::Scout)).unwrap() {
            PostOutcome::Posted(room) => {
                assert!(room.lead_connected);
                assert_eq!(room.scout_count, 1);
                assert!(room.scouts.is_none());
            }
            PostOutcome::Pong => panic!("expected posted"),
        }

        // Lead polls: exactly the scout join
        let poll = broker.poll_messages("R1", "lead1");
        assert_eq!(poll.messages.len(), 1);
        assert_eq!(poll.messages[0].kind, SignalKind::Join);
        assert_eq!(poll.room.scout_count, 1);

        // s1 posts an offer targeted at the lead
        let mut offer = message(SignalKind::Offer, "R1", "s1");
        offer.target_peer_id = Some("lead1".into());
        broker.post_message(offer).unwrap();

        // Lead polls again: exactly the offer, join already consumed
        let poll = broker.poll_messages("R1", "lead1");
        assert_eq!(poll.messages.len(), 1);
        assert_eq!(poll.messages[0].kind, SignalKind::Offer);

        // A second scout never sees s1's targeted offer
        let poll = broker.poll_messages("R1", "s2");
        assert!(poll
            .messages
            .iter()
            .all(|m| m.kind != SignalKind::Offer));
    }

    #[test]
    fn test_lead_join_overwrites() {
        let (broker, _) = test_broker();
        broker.post_message(join("R1", "lead1", PeerRole::Lead)).unwrap();

        match broker.post_message(join("R1", "lead2", PeerRole::Lead)).unwrap() {
            PostOutcome::Posted(room) => {
                assert!(room.lead_connected);
                assert_eq!(room.scout_count, 0);
            }
            PostOutcome::Pong => panic!("expected posted"),
        }
    }

    #[test]
    fn test_ttl_sweep_ignores_activity() {
        let (broker, clock) = test_broker();
        let ttl = Duration::from_secs(30 * 60);

        broker.post_message(join("R1", "lead1", PeerRole::Lead)).unwrap();

        // Activity just before expiry does not extend the room's life
        clock.advance(ttl.as_millis() as u64 - 1_000);
        broker.post_message(join("R1", "s1", PeerRole::Scout)).unwrap();
        assert!(broker.sweep(ttl).is_empty());

        clock.advance(2_000);
        assert_eq!(broker.sweep(ttl), vec!["R1".to_string()]);
        assert_eq!(broker.room_count(), 0);
    }

    #[test]
    fn test_leave_creates_room_on_reference() {
        let (broker, _) = test_broker();
        broker.post_message(message(SignalKind::Leave, "R1", "p1")).unwrap();

        assert_eq!(broker.room_count(), 1);
    }
}
