//! Per-contest debounced standings recompute

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use uuid::Uuid;

use super::StandingsService;

/// Coalesces recompute triggers so each contest has at most one pass in
/// flight plus at most one queued behind it.
#[derive(Clone)]
pub struct RecomputeScheduler {
    standings: Arc<StandingsService>,
    window: Duration,
    /// Contests with a pass in flight, mapped to their pending flag
    inflight: Arc<Mutex<HashMap<Uuid, bool>>>,
}

impl RecomputeScheduler {
    pub fn new(standings: Arc<StandingsService>, window: Duration) -> Self {
        Self {
            standings,
            window,
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Request a recompute without waiting for it.
    ///
    /// Returns `true` when a new background pass was started, `false` when
    /// the request was folded into the one already in flight.
    pub fn trigger(&self, contest_id: Uuid) -> bool {
        {
            let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(pending) = inflight.get_mut(&contest_id) {
                *pending = true;
                tracing::trace!(contest_id = %contest_id, "Recompute queued behind running pass");
                return false;
            }
            inflight.insert(contest_id, false);
        }

        let scheduler = self.clone();
        tokio::spawn(async move { scheduler.run(contest_id).await });
        true
    }

    /// Whether a pass is running or queued for `contest_id`
    pub fn is_running(&self, contest_id: &Uuid) -> bool {
        self.inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(contest_id)
    }

    async fn run(&self, contest_id: Uuid) {
        loop {
            if !self.window.is_zero() {
                tokio::time::sleep(self.window).await;
            }

            if let Err(e) = self.standings.refresh(contest_id).await {
                tracing::error!(contest_id = %contest_id, error = %e, "Standings recompute failed");
            }

            let again = {
                let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
                match inflight.get_mut(&contest_id) {
                    Some(pending) if *pending => {
                        *pending = false;
                        true
                    }
                    _ => {
                        inflight.remove(&contest_id);
                        false
                    }
                }
            };

            if !again {
                break;
            }
        }
    }
}
