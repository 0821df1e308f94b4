use std::collections::HashMap;

use super::room::Room;

/// Storage boundary for rooms and the connection-id -> room-id reverse
/// index. Pure storage, no policy: admission rules, id generation and
/// reaping all live in the RoomManager. A durable backing store can be
/// swapped in without touching manager logic.
pub trait RoomStore {
    fn add(&mut self, room: Room);
    fn get(&self, room_id: &str) -> Option<&Room>;
    fn get_mut(&mut self, room_id: &str) -> Option<&mut Room>;
    /// Removes and returns the room, or None if absent
    fn remove(&mut self, room_id: &str) -> Option<Room>;
    fn room_ids(&self) -> Vec<String>;
    fn len(&self) -> usize;

    fn map_user(&mut self, user_id: &str, room_id: &str);
    fn room_id_by_user(&self, user_id: &str) -> Option<String>;
    fn clear_user(&mut self, user_id: &str);
    /// Drops the host's and every participant's reverse-index entry in one
    /// step. Callers must pair this with `remove` inside a single critical
    /// section; a dangling reverse-index entry is a correctness bug.
    fn clear_mappings_for_room(&mut self, room: &Room);
}

#[derive(Debug, Default)]
pub struct MemoryRoomStore {
    rooms: HashMap<String, Room>,
    user_rooms: HashMap<String, String>,
}

impl MemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoomStore for MemoryRoomStore {
    fn add(&mut self, room: Room) {
        self.rooms.insert(room.id.clone(), room);
    }

    fn get(&self, room_id: &str) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    fn get_mut(&mut self, room_id: &str) -> Option<&mut Room> {
        self.rooms.get_mut(room_id)
    }

    fn remove(&mut self, room_id: &str) -> Option<Room> {
        self.rooms.remove(room_id)
    }

    fn room_ids(&self) -> Vec<String> {
        self.rooms.keys().cloned().collect()
    }

    fn len(&self) -> usize {
        self.rooms.len()
    }

    fn map_user(&mut self, user_id: &str, room_id: &str) {
        self.user_rooms.insert(user_id.to_string(), room_id.to_string());
    }

    fn room_id_by_user(&self, user_id: &str) -> Option<String> {
        self.user_rooms.get(user_id).cloned()
    }

    fn clear_user(&mut self, user_id: &str) {
        self.user_rooms.remove(user_id);
    }

    fn clear_mappings_for_room(&mut self, room: &Room) {
        if let Some(host) = &room.host {
            self.user_rooms.remove(&host.id);
        }
        for participant_id in room.participants.keys() {
            self.user_rooms.remove(participant_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rooms::room::{Host, Participant};

    fn sample_room(id: &str) -> Room {
        Room::new(id.to_string(), 1_000)
    }

    #[test]
    fn test_add_get_remove() {
        let mut store = MemoryRoomStore::new();
        store.add(sample_room("r1"));

        assert!(store.get("r1").is_some());
        assert!(store.get("missing").is_none());

        let removed = store.remove("r1").unwrap();
        assert_eq!(removed.id, "r1");
        assert!(store.remove("r1").is_none());
    }

    #[test]
    fn test_clear_mappings_covers_host_and_participants() {
        let mut store = MemoryRoomStore::new();
        let mut room = sample_room("r1");
        room.host = Some(Host {
            id: "h1".to_string(),
            name: "Alice".to_string(),
            joined_at: 1_000,
        });
        room.participants.insert(
            "p1".to_string(),
            Participant {
                id: "p1".to_string(),
                name: "Bob".to_string(),
                team: None,
                joined_at: 1_000,
                buzzed: false,
            },
        );

        store.map_user("h1", "r1");
        store.map_user("p1", "r1");
        store.clear_mappings_for_room(&room);

        assert!(store.room_id_by_user("h1").is_none());
        assert!(store.room_id_by_user("p1").is_none());
    }
}
