//! Out-of-band replay of dead-lettered verdicts

use std::sync::Arc;

use tokio::task::JoinHandle;

use super::{IngestOutcome, JudgeResultIngestor};
use crate::{
    cache::DeadLetterStore,
    config::DeadLetterConfig,
    error::{AppError, AppResult},
    models::DeadLetterRecord,
    utils::{calculate_backoff, now_utc, recent_days},
};

/// Tally of one replay sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Verdicts that reached a terminal outcome on replay
    pub resolved: usize,
    /// Verdicts that failed again and were parked with a higher attempt
    pub failed: usize,
    /// Records moved to the exhausted list
    pub exhausted: usize,
    /// Records dropped because their contest no longer exists
    pub dropped: usize,
}

impl ReplayStats {
    fn merge(&mut self, other: ReplayStats) {
        self.resolved += other.resolved;
        self.failed += other.failed;
        self.exhausted += other.exhausted;
        self.dropped += other.dropped;
    }

    pub fn total(&self) -> usize {
        self.resolved + self.failed + self.exhausted + self.dropped
    }
}

/// Dead-letter service
pub struct DeadLetterService {
    store: Arc<dyn DeadLetterStore>,
    ingestor: Arc<JudgeResultIngestor>,
    config: DeadLetterConfig,
}

impl DeadLetterService {
    pub fn new(
        store: Arc<dyn DeadLetterStore>,
        ingestor: Arc<JudgeResultIngestor>,
        config: DeadLetterConfig,
    ) -> Self {
        Self {
            store,
            ingestor,
            config,
        }
    }

    /// Records parked on a day (`YYYY-MM-DD`)
    pub async fn list(&self, day: &str) -> AppResult<Vec<DeadLetterRecord>> {
        self.store.list(day).await
    }

    pub async fn list_exhausted(&self) -> AppResult<Vec<DeadLetterRecord>> {
        self.store.list_exhausted().await
    }

    /// Replay today and the configured number of previous days
    pub async fn replay_recent(&self) -> AppResult<ReplayStats> {
        let mut stats = ReplayStats::default();
        for day in recent_days(now_utc().date_naive(), self.config.lookback_days) {
            stats.merge(self.replay_day(&day).await?);
        }
        Ok(stats)
    }

    /// Drain the records present on `day` when the sweep starts.
    ///
    /// Records that fail again are re-parked under today's bucket, so the
    /// sweep is bounded by the initial length.
    pub async fn replay_day(&self, day: &str) -> AppResult<ReplayStats> {
        let mut stats = ReplayStats::default();
        let backlog = self.store.list(day).await?.len();

        for _ in 0..backlog {
            let Some(record) = self.store.pop(day).await? else {
                break;
            };
            self.replay_record(record, &mut stats).await?;
        }

        if stats.total() > 0 {
            tracing::info!(
                day = %day,
                resolved = stats.resolved,
                failed = stats.failed,
                exhausted = stats.exhausted,
                dropped = stats.dropped,
                "Dead-letter sweep finished"
            );
        }

        Ok(stats)
    }

    async fn replay_record(
        &self,
        record: DeadLetterRecord,
        stats: &mut ReplayStats,
    ) -> AppResult<()> {
        if record.attempt >= self.config.max_attempts {
            tracing::error!(
                submission_id = %record.submission_id,
                attempts = record.attempt,
                error = %record.error,
                "Verdict exhausted its replay attempts"
            );
            self.store.push_exhausted(&record).await?;
            stats.exhausted += 1;
            return Ok(());
        }

        let attempt = record.attempt + 1;
        let delay = calculate_backoff(
            attempt,
            self.config.backoff_base_ms,
            self.config.backoff_max_ms,
        );
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match self
            .ingestor
            .ingest_attempt(record.submission_id, record.verdict.clone(), attempt)
            .await
        {
            Ok(IngestOutcome::DeadLettered) => stats.failed += 1,
            Ok(outcome) => {
                tracing::info!(
                    submission_id = %record.submission_id,
                    attempt,
                    outcome = outcome_name(&outcome),
                    "Replayed dead-lettered verdict"
                );
                stats.resolved += 1;
            }
            Err(AppError::ContestNotFound(contest_id)) => {
                tracing::warn!(
                    submission_id = %record.submission_id,
                    contest_id = %contest_id,
                    "Dropping dead-lettered verdict of a missing contest"
                );
                stats.dropped += 1;
            }
            Err(e) => {
                tracing::warn!(
                    submission_id = %record.submission_id,
                    attempt,
                    error = %e,
                    "Replay failed, parking verdict again"
                );
                let parked = DeadLetterRecord::new(
                    record.submission_id,
                    record.verdict,
                    e.to_string(),
                    attempt,
                );
                self.store.push(&parked).await?;
                stats.failed += 1;
            }
        }

        Ok(())
    }

    /// Periodic sweep on its own task
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.config.replay_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                if let Err(e) = self.replay_recent().await {
                    tracing::error!(error = %e, "Dead-letter sweep failed");
                }
            }
        })
    }
}

fn outcome_name(outcome: &IngestOutcome) -> &'static str {
    match outcome {
        IngestOutcome::Applied(_) => "applied",
        IngestOutcome::LockContended => "lock_contended",
        IngestOutcome::NotAContestSubmission => "not_a_contest_submission",
        IngestOutcome::LateVerdict => "late_verdict",
        IngestOutcome::AlreadyProcessed => "already_processed",
        IngestOutcome::NotFinal => "not_final",
        IngestOutcome::DeadLettered => "dead_lettered",
    }
}
