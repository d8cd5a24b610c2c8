//! In-process room registry backed by tokio broadcast channels

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::Publisher;
use crate::{
    constants::ROOM_CHANNEL_CAPACITY,
    error::{AppError, AppResult},
    models::{RealtimeEvent, Room},
};

/// One broadcast channel per room. Slow subscribers lag and drop events
/// independently of each other.
#[derive(Clone)]
pub struct RoomHub {
    rooms: Arc<RwLock<HashMap<Room, broadcast::Sender<RealtimeEvent>>>>,
    capacity: usize,
}

impl Default for RoomHub {
    fn default() -> Self {
        Self::new(ROOM_CHANNEL_CAPACITY)
    }
}

impl RoomHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    /// Join a room, creating it on first use
    pub fn subscribe(&self, room: Room) -> AppResult<broadcast::Receiver<RealtimeEvent>> {
        let mut rooms = self.rooms.write().map_err(|_| poisoned())?;
        let sender = rooms
            .entry(room)
            .or_insert_with(|| broadcast::channel(self.capacity).0);
        Ok(sender.subscribe())
    }

    pub fn subscriber_count(&self, room: &Room) -> usize {
        self.rooms
            .read()
            .ok()
            .and_then(|rooms| rooms.get(room).map(|tx| tx.receiver_count()))
            .unwrap_or(0)
    }

    /// Forget rooms nobody listens to any more
    pub fn prune(&self) -> usize {
        let Ok(mut rooms) = self.rooms.write() else {
            return 0;
        };
        let before = rooms.len();
        rooms.retain(|_, tx| tx.receiver_count() > 0);
        before - rooms.len()
    }
}

#[async_trait]
impl Publisher for RoomHub {
    async fn publish(&self, room: Room, event: &RealtimeEvent) -> AppResult<()> {
        let sender = {
            let rooms = self.rooms.read().map_err(|_| poisoned())?;
            rooms.get(&room).cloned()
        };

        let Some(sender) = sender else {
            tracing::trace!(room = %room, "No subscribers for room");
            return Ok(());
        };

        match sender.send(event.clone()) {
            Ok(receivers) => {
                tracing::debug!(room = %room, event = event.kind(), receivers, "Published event");
            }
            Err(_) => {
                self.prune();
            }
        }
        Ok(())
    }
}

fn poisoned() -> AppError {
    AppError::Publish("room registry lock poisoned".to_string())
}
