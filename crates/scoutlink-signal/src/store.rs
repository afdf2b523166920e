//! Room storage
//!
//! The room table sits behind a small interface so the broker owns its state
//! explicitly instead of leaning on a process-wide map, and so tests can pair
//! a fresh store with a deterministic clock. Every closure passed to a store
//! runs under that room's lock, so room-level operations are serialized.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

use scoutlink_core::Clock;

use crate::room::Room;

/// Storage interface for the broker's room table
pub trait RoomStore: Send + Sync {
    /// Run `f` against an existing room; `None` if the room does not exist
    fn with_room<R>(&self, room_id: &str, f: impl FnOnce(&mut Room) -> R) -> Option<R>;

    /// Run `f` against the room, creating it on first reference
    fn with_room_or_create<R>(&self, room_id: &str, f: impl FnOnce(&mut Room) -> R) -> R;

    /// Remove a room; returns whether it existed
    fn remove(&self, room_id: &str) -> bool;

    /// Drop every room whose age exceeds `ttl`, unconditionally, and return
    /// the dropped ids. Age is counted from creation; activity does not
    /// refresh it.
    fn sweep(&self, ttl: Duration) -> Vec<String>;

    /// Number of live rooms
    fn room_count(&self) -> usize;
}

/// In-memory room table
pub struct MemoryStore {
    rooms: DashMap<String, Room>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            rooms: DashMap::new(),
            clock,
        }
    }
}

impl RoomStore for MemoryStore {
    fn with_room<R>(&self, room_id: &str, f: impl FnOnce(&mut Room) -> R) -> Option<R> {
        self.rooms.get_mut(room_id).map(|mut room| f(&mut room))
    }

    fn with_room_or_create<R>(&self, room_id: &str, f: impl FnOnce(&mut Room) -> R) -> R {
        let mut room = self
            .rooms
            .entry(room_id.to_string())
            .or_insert_with(|| Room::new(room_id, self.clock.now_millis()));
        f(&mut room)
    }

    fn remove(&self, room_id: &str) -> bool {
        self.rooms.remove(room_id).is_some()
    }

    fn sweep(&self, ttl: Duration) -> Vec<String> {
        let now = self.clock.now_millis();
        let ttl_millis = ttl.as_millis() as u64;

        let expired: Vec<String> = self
            .rooms
            .iter()
            .filter(|room| room.is_expired(now, ttl_millis))
            .map(|room| room.id.clone())
            .collect();

        for id in &expired {
            self.rooms.remove(id);
        }

        expired
    }

    fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
