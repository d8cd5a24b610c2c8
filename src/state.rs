//! Application state management
//!
//! This module contains the shared application state that is passed
//! to all request handlers via Axum's State extractor.

use std::sync::Arc;

use crate::{
    realtime::RoomHub,
    services::{DeadLetterService, Engine, JudgeResultIngestor, StandingsService},
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

/// Inner state (wrapped in Arc for cheap cloning)
struct AppStateInner {
    /// Wired scoring engine
    engine: Engine,

    /// Subscription rooms for server-sent events
    hub: RoomHub,
}

impl AppState {
    /// Create a new application state
    pub fn new(engine: Engine, hub: RoomHub) -> Self {
        Self {
            inner: Arc::new(AppStateInner { engine, hub }),
        }
    }

    pub fn standings(&self) -> &StandingsService {
        &self.inner.engine.standings
    }

    /// Shared handle on the ingestor, for detached ingestion tasks
    pub fn ingestor(&self) -> Arc<JudgeResultIngestor> {
        self.inner.engine.ingestor.clone()
    }

    pub fn dead_letters(&self) -> &DeadLetterService {
        &self.inner.engine.dead_letters
    }

    pub fn hub(&self) -> &RoomHub {
        &self.inner.hub
    }
}
