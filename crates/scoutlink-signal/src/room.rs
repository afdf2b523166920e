//! Room state: roster and mailbox
//!
//! A room groups one lead and any number of scouts under an application-chosen
//! id. Pending signaling messages sit in an append-only mailbox that peers
//! drain by polling; fetching a message is the acknowledgement (pull = ack),
//! there is no separate ack round-trip.

use std::collections::{HashMap, HashSet};

use crate::messages::{PeerRole, RoomSummary, ScoutInfo, SignalKind, SignalMessage};

/// A peer on the room roster
#[derive(Clone, Debug)]
pub struct PeerEntry {
    pub id: String,
    pub name: String,
    pub last_seen: u64,
}

/// A queued signaling message plus its per-recipient delivery record
#[derive(Clone, Debug)]
pub struct MailboxMessage {
    pub message: SignalMessage,
    /// Peers that have already fetched this message
    pub delivered_to: HashSet<String>,
}

/// A room where a lead and its scouts exchange setup messages
pub struct Room {
    /// Application-chosen room id
    pub id: String,

    /// At most one lead per room
    lead: Option<PeerEntry>,

    /// Scouts keyed by peer id
    scouts: HashMap<String, PeerEntry>,

    /// Pending messages, in arrival order
    mailbox: Vec<MailboxMessage>,

    /// Set once at creation; never refreshed by activity
    created_at: u64,
}

impl Room {
    /// Create a new room
    pub fn new(id: impl Into<String>, created_at: u64) -> Self {
        Self {
            id: id.into(),
            lead: None,
            scouts: HashMap::new(),
            mailbox: Vec::new(),
            created_at,
        }
    }

    /// Creation time in milliseconds
    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    /// Whether the room's age exceeds `ttl_millis` at time `now`
    pub fn is_expired(&self, now: u64, ttl_millis: u64) -> bool {
        now.saturating_sub(self.created_at) > ttl_millis
    }

    /// Record a join: update the roster and queue the join message so the
    /// other side can observe the arrival.
    pub fn record_join(&mut self, message: &SignalMessage, now: u64) {
        let peer_id = message.peer_id.clone().unwrap_or_default();

        match message.role {
            Some(PeerRole::Lead) => {
                self.lead = Some(PeerEntry {
                    id: peer_id,
                    name: message.peer_name.clone().unwrap_or_else(|| "Lead".into()),
                    last_seen: now,
                });
            }
            Some(PeerRole::Scout) => {
                self.scouts.insert(
                    peer_id.clone(),
                    PeerEntry {
                        id: peer_id,
                        name: message.peer_name.clone().unwrap_or_else(|| "Scout".into()),
                        last_seen: now,
                    },
                );
            }
            None => {}
        }

        self.push_message(message.clone());
    }

    /// Record a leave: drop the roster entry. Nothing is queued; peers detect
    /// departure via connection state, not via polling. Already-queued
    /// messages from this peer stay in the mailbox.
    pub fn record_leave(&mut self, message: &SignalMessage) {
        match message.role {
            Some(PeerRole::Lead) => self.lead = None,
            _ => {
                if let Some(peer_id) = &message.peer_id {
                    self.scouts.remove(peer_id);
                }
            }
        }
    }

    /// Append a message to the mailbox with a fresh delivery record
    pub fn push_message(&mut self, message: SignalMessage) {
        self.mailbox.push(MailboxMessage {
            message,
            delivered_to: HashSet::new(),
        });
    }

    /// Fetch every pending message visible to `peer_id` and mark it delivered.
    ///
    /// A message is visible when all of: it was not sent by this peer, this
    /// peer has not fetched it before, and it is not targeted at someone else.
    /// Retention runs afterwards; see [`Room::apply_retention`].
    pub fn drain_for(&mut self, peer_id: &str) -> Vec<SignalMessage> {
        let mut delivered = Vec::new();

        for entry in &mut self.mailbox {
            let own = entry.message.peer_id.as_deref() == Some(peer_id);
            let already_seen = entry.delivered_to.contains(peer_id);
            let targeted_elsewhere = entry
                .message
                .target_peer_id
                .as_deref()
                .is_some_and(|target| target != peer_id);

            if !own && !already_seen && !targeted_elsewhere {
                entry.delivered_to.insert(peer_id.to_string());
                delivered.push(entry.message.clone());
            }
        }

        self.apply_retention();
        delivered
    }

    /// Purge messages that have served their purpose:
    ///
    /// - a scout's join, once the current lead has fetched it (immediately if
    ///   there is no lead);
    /// - the lead's join, once every currently-known scout has fetched it;
    /// - anything else, once a second distinct peer has fetched it. Setup
    ///   messages are assumed unicast in practice, so two fetches means the
    ///   one real consumer has it.
    fn apply_retention(&mut self) {
        let lead_id = self.lead.as_ref().map(|l| l.id.clone());
        let scout_ids: Vec<String> = self.scouts.keys().cloned().collect();

        self.mailbox.retain(|entry| {
            match (entry.message.kind, entry.message.role) {
                (SignalKind::Join, Some(PeerRole::Scout)) => match &lead_id {
                    Some(lead) => !entry.delivered_to.contains(lead),
                    None => false,
                },
                (SignalKind::Join, Some(PeerRole::Lead)) => scout_ids
                    .iter()
                    .any(|scout| !entry.delivered_to.contains(scout)),
                _ => entry.delivered_to.len() <= 1,
            }
        });
    }

    /// Room state summary; `with_scouts` includes the live roster
    pub fn summary(&self, with_scouts: bool) -> RoomSummary {
        RoomSummary {
            id: self.id.clone(),
            lead_connected: self.lead.is_some(),
            scout_count: self.scouts.len(),
            scouts: with_scouts.then(|| {
                self.scouts
                    .values()
                    .map(|s| ScoutInfo {
                        id: s.id.clone(),
                        name: s.name.clone(),
                    })
                    .collect()
            }),
        }
    }

    /// Number of pending mailbox messages
    pub fn mailbox_len(&self) -> usize {
        self.mailbox.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn join(peer_id: &str, role: PeerRole) -> SignalMessage {
        SignalMessage {
            kind: SignalKind::Join,
            room_id: Some("R1".into()),
            peer_id: Some(peer_id.into()),
            peer_name: None,
            role: Some(role),
            target_peer_id: None,
            data: None,
        }
    }

    fn offer(from: &str, to: &str) -> SignalMessage {
        SignalMessage {
            kind: SignalKind::Offer,
            room_id: Some("R1".into()),
            peer_id: Some(from.into()),
            peer_name: None,
            role: None,
            target_peer_id: Some(to.into()),
            data: None,
        }
    }

    #[test]
    fn test_join_updates_roster() {
        let mut room = Room::new("R1", 0);

        room.record_join(&join("lead1", PeerRole::Lead), 0);
        room.record_join(&join("s1", PeerRole::Scout), 0);

        let summary = room.summary(true);
        assert!(summary.lead_connected);
        assert_eq!(summary.scout_count, 1);
        assert_eq!(summary.scouts.unwrap()[0].id, "s1");
    }

    #[test]
    fn test_leave_removes_roster_only() {
        let mut room = Room::new("R1", 0);
        room.record_join(&join("lead1", PeerRole::Lead), 0);
        room.record_join(&join("s1", PeerRole::Scout), 0);

        let mut leave = join("s1", PeerRole::Scout);
        leave.kind = SignalKind::Leave;
        room.record_leave(&leave);

        assert_eq!(room.summary(false).scout_count, 0);
        // Queued join messages are not retroactively deleted
        assert!(room.mailbox_len() > 0);
    }

    #[test]
    fn test_no_self_delivery() {
        let mut room = Room::new("R1", 0);
        room.record_join(&join("s1", PeerRole::Scout), 0);

        assert!(room.drain_for("s1").is_empty());
    }

    #[test]
    fn test_targeted_message_only_reaches_target() {
        let mut room = Room::new("R1", 0);
        room.push_message(offer("s1", "lead1"));

        assert!(room.drain_for("s2").is_empty());
        let got = room.drain_for("lead1");
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].kind, SignalKind::Offer);
    }

    #[test]
    fn test_scout_join_purged_once_lead_sees_it() {
        let mut room = Room::new("R1", 0);
        room.record_join(&join("lead1", PeerRole::Lead), 0);
        // Lead's own join purges right away: no scouts exist yet to wait for
        room.drain_for("lead1");
        room.record_join(&join("s1", PeerRole::Scout), 0);

        assert_eq!(room.drain_for("lead1").len(), 1);
        assert!(room.drain_for("lead1").is_empty());
        assert_eq!(room.mailbox_len(), 0);
    }

    #[test]
    fn test_scout_join_purged_when_no_lead() {
        let mut room = Room::new("R1", 0);
        room.record_join(&join("s1", PeerRole::Scout), 0);

        // Any poll applies retention; with no lead, the join drops immediately
        room.drain_for("s2");
        assert_eq!(room.mailbox_len(), 0);
    }

    #[test]
    fn test_lead_join_retained_until_all_scouts_see_it() {
        let mut room = Room::new("R1", 0);
        room.record_join(&join("s1", PeerRole::Scout), 0);
        room.record_join(&join("s2", PeerRole::Scout), 0);
        room.record_join(&join("lead1", PeerRole::Lead), 0);

        assert_eq!(
            room.drain_for("s1")
                .iter()
                .filter(|m| m.role == Some(PeerRole::Lead))
                .count(),
            1
        );
        assert!(room.mailbox_len() > 0, "s2 has not seen the lead join yet");

        room.drain_for("s2");
        // Lead join gone; scout joins remain until the lead fetches them
        assert_eq!(room.mailbox_len(), 2);

        room.drain_for("lead1");
        assert_eq!(room.mailbox_len(), 0);
    }

    #[test]
    fn test_setup_message_purged_after_second_fetcher() {
        let mut room = Room::new("R1", 0);
        // Untargeted answer: visible to everyone, assumed unicast in practice
        let mut answer = offer("s1", "lead1");
        answer.kind = SignalKind::Answer;
        answer.target_peer_id = None;
        room.push_message(answer);

        assert_eq!(room.drain_for("a").len(), 1);
        assert_eq!(room.mailbox_len(), 1, "one fetch keeps it");

        assert_eq!(room.drain_for("b").len(), 1);
        assert_eq!(room.mailbox_len(), 0, "second fetch purges it");
    }

    #[test]
    fn test_expiry_is_age_based() {
        let room = Room::new("R1", 1_000);

        assert!(!room.is_expired(1_500, 1_000));
        assert!(room.is_expired(2_001, 1_000));
    }
}
