//! Real-time fan-out of verdicts, standings and first bloods.
//!
//! Delivery is best-effort. Publishing never fails the caller; errors are
//! logged by [`Broadcaster`] and dropped.

pub mod hub;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::{RealtimeEvent, Room},
};

pub use hub::RoomHub;

/// Transport that delivers an event to the subscribers of a room
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, room: Room, event: &RealtimeEvent) -> AppResult<()>;
}

/// Fire-and-forget wrapper around a [`Publisher`]
#[derive(Clone)]
pub struct Broadcaster {
    publisher: Arc<dyn Publisher>,
}

impl Broadcaster {
    pub fn new(publisher: Arc<dyn Publisher>) -> Self {
        Self { publisher }
    }

    pub async fn emit(&self, room: Room, event: RealtimeEvent) {
        if let Err(e) = self.publisher.publish(room, &event).await {
            tracing::warn!(
                room = %room,
                event = event.kind(),
                error = %e,
                "Failed to publish event"
            );
        }
    }
}
