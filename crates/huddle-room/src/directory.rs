//! Room directory: maps room ids to live room actors.

use std::collections::HashMap;

use huddle_protocol::RoomId;
use tokio::sync::Mutex;

use crate::RoomConfig;
use crate::room::{RoomHandle, spawn_room};

/// Tracks every live room by id.
///
/// The lock only guards the map itself and is never held while talking to
/// a room, so a slow room cannot stall lookups of other rooms.
#[derive(Debug)]
pub struct Directory {
    rooms: Mutex<HashMap<RoomId, RoomHandle>>,
    config: RoomConfig,
}

impl Directory {
    /// Creates an empty directory. Rooms it spawns use `config`.
    pub fn new(config: RoomConfig) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Returns the live room with this id, spawning a fresh one with the
    /// default deck if there is none.
    ///
    /// Concurrent callers asking for the same id get handles to the same
    /// actor. A room that has already shut down is replaced.
    pub async fn get_or_create(&self, room_id: &RoomId) -> RoomHandle {
        let mut rooms = self.rooms.lock().await;
        if let Some(handle) = rooms.get(room_id) {
            if !handle.is_closed() {
                return handle.clone();
            }
        }

        let handle = spawn_room(room_id.clone(), self.config.clone());
        rooms.insert(room_id.clone(), handle.clone());
        tracing::info!(%room_id, rooms = rooms.len(), "room created");
        handle
    }

    /// Returns the live room with this id, if any.
    pub async fn get(&self, room_id: &RoomId) -> Option<RoomHandle> {
        self.rooms
            .lock()
            .await
            .get(room_id)
            .filter(|handle| !handle.is_closed())
            .cloned()
    }

    /// Drops the entry for `room_id` if its room has shut down. Returns
    /// whether an entry was removed.
    ///
    /// An entry replaced by a fresh room in the meantime is left alone.
    pub async fn remove_if_empty(&self, room_id: &RoomId) -> bool {
        let mut rooms = self.rooms.lock().await;
        let closed = rooms.get(room_id).is_some_and(RoomHandle::is_closed);
        if closed {
            rooms.remove(room_id);
            tracing::info!(%room_id, rooms = rooms.len(), "room removed");
        }
        closed
    }

    /// Returns cloned handles to all live rooms.
    ///
    /// Callers talk to the rooms after the directory lock is released.
    pub async fn handles(&self) -> Vec<RoomHandle> {
        self.rooms
            .lock()
            .await
            .values()
            .filter(|handle| !handle.is_closed())
            .cloned()
            .collect()
    }

    /// Number of live rooms.
    pub async fn room_count(&self) -> usize {
        self.rooms
            .lock()
            .await
            .values()
            .filter(|handle| !handle.is_closed())
            .count()
    }
}

impl Default for Directory {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}
