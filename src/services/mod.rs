//! Business logic services

pub mod dead_letter_service;
pub mod freeze;
pub mod ingest_service;
pub mod ranking;
pub mod recompute;
pub mod scoring;
pub mod standings_service;

use std::sync::Arc;

pub use dead_letter_service::{DeadLetterService, ReplayStats};
pub use ingest_service::{IngestOutcome, JudgeResultIngestor};
pub use recompute::RecomputeScheduler;
pub use standings_service::StandingsService;

use crate::{
    cache::{CacheStore, DeadLetterStore, LockProvider},
    config::{DeadLetterConfig, StandingsConfig},
    db::ContestStore,
    realtime::{Broadcaster, Publisher},
};

/// Storage and transport capabilities the engine is built from
pub struct EngineDeps {
    pub store: Arc<dyn ContestStore>,
    pub locks: Arc<dyn LockProvider>,
    pub cache: Arc<dyn CacheStore>,
    pub dead_letters: Arc<dyn DeadLetterStore>,
    pub publisher: Arc<dyn Publisher>,
}

/// Fully wired scoring engine
#[derive(Clone)]
pub struct Engine {
    pub standings: Arc<StandingsService>,
    pub scheduler: RecomputeScheduler,
    pub ingestor: Arc<JudgeResultIngestor>,
    pub dead_letters: Arc<DeadLetterService>,
}

impl Engine {
    pub fn new(
        deps: EngineDeps,
        standings: StandingsConfig,
        dead_letter: DeadLetterConfig,
    ) -> Self {
        let broadcaster = Broadcaster::new(deps.publisher);

        let standings_service = Arc::new(StandingsService::new(
            deps.store.clone(),
            deps.cache,
            broadcaster.clone(),
            standings.clone(),
        ));
        let scheduler =
            RecomputeScheduler::new(standings_service.clone(), standings.debounce_window);

        let ingestor = Arc::new(JudgeResultIngestor::new(
            deps.store,
            deps.locks,
            deps.dead_letters.clone(),
            broadcaster,
            standings_service.clone(),
            scheduler.clone(),
            standings,
        ));

        let dead_letters = Arc::new(DeadLetterService::new(
            deps.dead_letters,
            ingestor.clone(),
            dead_letter,
        ));

        Self {
            standings: standings_service,
            scheduler,
            ingestor,
            dead_letters,
        }
    }
}
