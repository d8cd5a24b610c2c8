//! Standings reads, cache maintenance and recompute passes

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{freeze::project_frozen, ranking};
use crate::{
    cache::{self, CacheStore},
    config::StandingsConfig,
    constants::{MAX_STANDINGS_PAGE_SIZE, keys},
    db::ContestStore,
    error::{AppError, AppResult},
    models::{
        Contest, RankingEntry, RealtimeEvent, Room, StandingsPage, StandingsSnapshot,
        StandingsUpdateEvent,
    },
    realtime::Broadcaster,
    utils::now_utc,
};

/// Standings service for business logic
pub struct StandingsService {
    store: Arc<dyn ContestStore>,
    cache: Arc<dyn CacheStore>,
    broadcaster: Broadcaster,
    config: StandingsConfig,
}

impl StandingsService {
    pub fn new(
        store: Arc<dyn ContestStore>,
        cache: Arc<dyn CacheStore>,
        broadcaster: Broadcaster,
        config: StandingsConfig,
    ) -> Self {
        Self {
            store,
            cache,
            broadcaster,
            config,
        }
    }

    /// Rebuild the full ranking from processed submissions
    pub async fn compute_rankings(&self, contest_id: Uuid) -> AppResult<Vec<RankingEntry>> {
        let contest = self.load_contest(contest_id).await?;
        let submissions = self.store.list_by_contest(&contest.id).await?;
        ranking::aggregate(&contest, &submissions)
    }

    /// One page of standings, frozen or live.
    ///
    /// Served from the page cache when possible, otherwise projected from the
    /// memoized full ranking.
    pub async fn get_standings(
        &self,
        contest_id: Uuid,
        page: u32,
        limit: u32,
        is_frozen: bool,
    ) -> AppResult<StandingsPage> {
        let (page, limit) = normalize_page(page, limit);
        if let Some(cached) = self.cached_page(contest_id, page, limit, is_frozen).await {
            return Ok(cached);
        }

        let contest = self.load_contest(contest_id).await?;
        self.render_page(&contest, page, limit, is_frozen).await
    }

    /// Standings as the public sees them right now: frozen inside the freeze
    /// window, live otherwise. Drafts and hidden contests do not exist here.
    pub async fn get_public_standings(
        &self,
        contest_id: Uuid,
        page: u32,
        limit: u32,
    ) -> AppResult<StandingsPage> {
        let now = now_utc();
        let contest = self.load_public_contest(contest_id, now).await?;

        let (page, limit) = normalize_page(page, limit);
        let is_frozen = contest.is_frozen_at(now);
        if let Some(cached) = self.cached_page(contest_id, page, limit, is_frozen).await {
            return Ok(cached);
        }
        self.render_page(&contest, page, limit, is_frozen).await
    }

    /// A contest as the public sees it, `ContestNotFound` for drafts and
    /// hidden contests
    pub async fn public_contest(&self, contest_id: Uuid) -> AppResult<Contest> {
        self.load_public_contest(contest_id, now_utc()).await
    }

    /// Current public top of the board, shaped like a recompute broadcast
    pub async fn public_update(&self, contest_id: Uuid) -> AppResult<StandingsUpdateEvent> {
        let now = now_utc();
        let contest = self.load_public_contest(contest_id, now).await?;
        let snapshot = self.current_snapshot(&contest).await?;
        Ok(self.update_event(&contest, &snapshot, now))
    }

    async fn cached_page(
        &self,
        contest_id: Uuid,
        page: u32,
        limit: u32,
        is_frozen: bool,
    ) -> Option<StandingsPage> {
        let page_key = keys::standings_page(&contest_id, page, limit, is_frozen);
        match cache::get_json::<StandingsPage>(&*self.cache, &page_key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(
                    contest_id = %contest_id,
                    error = %e,
                    "Standings page cache read failed"
                );
                None
            }
        }
    }

    async fn render_page(
        &self,
        contest: &Contest,
        page: u32,
        limit: u32,
        is_frozen: bool,
    ) -> AppResult<StandingsPage> {
        let snapshot = self.current_snapshot(contest).await?;
        let view = if is_frozen {
            project_frozen(&snapshot, contest.freeze_start())
        } else {
            snapshot
        };

        let result = StandingsPage::from_snapshot(&view, page, limit);

        let page_key = keys::standings_page(&contest.id, page, limit, is_frozen);
        if let Err(e) =
            cache::set_json(&*self.cache, &page_key, &result, self.config.page_cache_ttl).await
        {
            tracing::warn!(contest_id = %contest.id, error = %e, "Failed to cache standings page");
        }

        Ok(result)
    }

    /// Drop every cached view of a contest
    pub async fn invalidate(&self, contest_id: Uuid) -> AppResult<u64> {
        let removed = self
            .cache
            .delete_prefix(&keys::standings_prefix(&contest_id))
            .await?;
        tracing::debug!(contest_id = %contest_id, removed, "Invalidated standings cache");
        Ok(removed)
    }

    /// Recompute pass: aggregate, refresh caches and the persisted snapshot,
    /// then push the top of the board to the contest room.
    ///
    /// Only the aggregation can fail the pass. Cache and snapshot writes
    /// degrade to a warning so subscribers still get the update.
    pub async fn refresh(&self, contest_id: Uuid) -> AppResult<StandingsSnapshot> {
        let contest = self.load_contest(contest_id).await?;
        let snapshot = self.build_snapshot(&contest).await?;

        if let Err(e) = self.invalidate(contest_id).await {
            tracing::warn!(
                contest_id = %contest_id,
                error = %e,
                "Failed to invalidate standings cache"
            );
        }
        self.cache_full(&snapshot).await;
        if let Err(e) = self.store.save_snapshot(&snapshot).await {
            tracing::warn!(
                contest_id = %contest_id,
                error = %e,
                "Failed to persist standings snapshot"
            );
        }

        let event = self.update_event(&contest, &snapshot, now_utc());

        tracing::info!(
            contest_id = %contest_id,
            entries = snapshot.rankings.len(),
            is_frozen = event.is_frozen,
            "Standings recomputed"
        );

        self.broadcaster
            .emit(Room::Contest(contest_id), RealtimeEvent::StandingsUpdate(event))
            .await;

        Ok(snapshot)
    }

    async fn load_contest(&self, contest_id: Uuid) -> AppResult<Contest> {
        self.store
            .find_contest(&contest_id)
            .await?
            .ok_or(AppError::ContestNotFound(contest_id))
    }

    async fn load_public_contest(
        &self,
        contest_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Contest> {
        let contest = self.load_contest(contest_id).await?;
        if !contest.is_public(now) {
            tracing::debug!(
                contest_id = %contest_id,
                status = %contest.status(now),
                "Standings requested for non-public contest"
            );
            return Err(AppError::ContestNotFound(contest_id));
        }
        Ok(contest)
    }

    /// Top-N update for the contest room, frozen while `now` is inside the
    /// freeze window
    fn update_event(
        &self,
        contest: &Contest,
        snapshot: &StandingsSnapshot,
        now: DateTime<Utc>,
    ) -> StandingsUpdateEvent {
        let is_frozen = contest.is_frozen_at(now);
        let view = if is_frozen {
            project_frozen(snapshot, contest.freeze_start())
        } else {
            snapshot.clone()
        };

        StandingsUpdateEvent {
            contest_id: contest.id,
            rankings: view
                .rankings
                .into_iter()
                .take(self.config.broadcast_top_n)
                .collect(),
            last_updated: view.last_updated,
            total_participants: contest.participant_count(),
            is_frozen,
        }
    }

    async fn build_snapshot(&self, contest: &Contest) -> AppResult<StandingsSnapshot> {
        let submissions = self.store.list_by_contest(&contest.id).await?;
        let processed = submissions.iter().filter(|s| s.is_processed).count() as i64;

        Ok(StandingsSnapshot {
            contest_id: contest.id,
            scoring_system: contest.scoring_system,
            rankings: ranking::aggregate(contest, &submissions)?,
            last_updated: now_utc(),
            is_frozen: false,
            processed_submissions: processed,
        })
    }

    async fn cache_full(&self, snapshot: &StandingsSnapshot) {
        let full_key = keys::standings_full(&snapshot.contest_id);
        if let Err(e) =
            cache::set_json(&*self.cache, &full_key, snapshot, self.config.ranking_cache_ttl).await
        {
            tracing::warn!(
                contest_id = %snapshot.contest_id,
                error = %e,
                "Failed to cache full ranking"
            );
        }
    }

    /// Live full ranking: cache, then persisted snapshot, then a fresh build.
    ///
    /// A cached or persisted snapshot is used only while it covers every
    /// verdict applied to the contest; otherwise the ranking is rebuilt.
    async fn current_snapshot(&self, contest: &Contest) -> AppResult<StandingsSnapshot> {
        let full_key = keys::standings_full(&contest.id);

        match cache::get_json::<StandingsSnapshot>(&*self.cache, &full_key).await {
            Ok(Some(snapshot)) if snapshot.is_current_for(contest) => return Ok(snapshot),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(
                    contest_id = %contest.id,
                    error = %e,
                    "Full ranking cache read failed"
                );
            }
        }

        let snapshot = match self.store.load_snapshot(&contest.id).await {
            Ok(Some(snapshot)) if snapshot.is_current_for(contest) => snapshot,
            loaded => {
                if let Err(e) = loaded {
                    tracing::warn!(
                        contest_id = %contest.id,
                        error = %e,
                        "Failed to load standings snapshot"
                    );
                }
                let snapshot = self.build_snapshot(contest).await?;
                if let Err(e) = self.store.save_snapshot(&snapshot).await {
                    tracing::warn!(
                        contest_id = %contest.id,
                        error = %e,
                        "Failed to persist standings snapshot"
                    );
                }
                snapshot
            }
        };

        self.cache_full(&snapshot).await;
        Ok(snapshot)
    }
}

/// Page starts at 1; limit is clamped to `1..=MAX_STANDINGS_PAGE_SIZE`
fn normalize_page(page: u32, limit: u32) -> (u32, u32) {
    (page.max(1), limit.clamp(1, MAX_STANDINGS_PAGE_SIZE))
}
