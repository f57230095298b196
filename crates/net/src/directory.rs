//! Session directory - the registry of live rooms
//!
//! Rooms are created on first join, destroyed when their last player leaves and
//! reaped when they get too old. The default room is seeded at construction
//! and survives both.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::room::Room;

#[derive(Debug)]
pub struct SessionDirectory {
    rooms: HashMap<String, Room>,
    default_room: String,
}

impl SessionDirectory {
    pub fn new(default_room: impl Into<String>, now: Instant) -> Self {
        let default_room = default_room.into();
        let mut rooms = HashMap::new();
        rooms.insert(default_room.clone(), Room::new(default_room.clone(), now));
        Self {
            rooms,
            default_room,
        }
    }

    pub fn default_room(&self) -> &str {
        &self.default_room
    }

    pub fn is_default(&self, room_id: &str) -> bool {
        room_id == self.default_room
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn contains(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn get(&self, room_id: &str) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn get_mut(&mut self, room_id: &str) -> Option<&mut Room> {
        self.rooms.get_mut(room_id)
    }

    /// Existing room, or a fresh one created at `now`
    pub fn get_or_create(&mut self, room_id: &str, now: Instant) -> &mut Room {
        self.rooms
            .entry(room_id.to_string())
            .or_insert_with(|| Room::new(room_id, now))
    }

    /// Destroy `room_id` if it has no players and is not the default room.
    /// Returns true if the room was removed.
    pub fn remove_if_empty(&mut self, room_id: &str) -> bool {
        if self.is_default(room_id) {
            return false;
        }
        match self.rooms.get(room_id) {
            Some(room) if room.is_empty() => {
                self.rooms.remove(room_id);
                true
            }
            _ => false,
        }
    }

    /// Remove and return every non-default room older than `max_age`
    pub fn reap_expired(&mut self, now: Instant, max_age: Duration) -> Vec<Room> {
        let expired: Vec<String> = self
            .rooms
            .iter()
            .filter(|(id, room)| !self.is_default(id) && room.is_expired(now, max_age))
            .map(|(id, _)| id.clone())
            .collect();

        expired
            .into_iter()
            .filter_map(|id| self.rooms.remove(&id))
            .collect()
    }
}
