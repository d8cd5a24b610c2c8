//! Judge verdict ingestion
//!
//! Applies each final verdict to its contest submission exactly once, then
//! fans out real-time events and schedules a standings recompute.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{RecomputeScheduler, StandingsService, scoring};
use crate::{
    cache::{DeadLetterStore, LockProvider},
    config::StandingsConfig,
    constants::{DEFAULT_PROBLEM_POINTS, keys},
    db::ContestStore,
    error::{AppError, AppResult},
    models::{
        ApplyOutcome, Contest, ContestSubmission, DeadLetterRecord, FirstBloodClaim,
        FirstBloodEvent, JudgeResult, RealtimeEvent, Room, SubmissionResultEvent, VerdictTag,
        VerdictUpdate,
    },
    realtime::Broadcaster,
    utils::now_utc,
};

/// What happened to one delivered verdict
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// Verdict written; carries the updated record
    Applied(ContestSubmission),
    /// Another worker holds the submission's lock
    LockContended,
    /// Submission is not part of any contest
    NotAContestSubmission,
    /// Arrived after the contest's grace period
    LateVerdict,
    /// A verdict was already applied
    AlreadyProcessed,
    /// Intermediate verdict; waiting for the final one
    NotFinal,
    /// Lock or transaction failed; verdict parked for replay
    DeadLettered,
}

/// Judge result ingestor
pub struct JudgeResultIngestor {
    store: Arc<dyn ContestStore>,
    locks: Arc<dyn LockProvider>,
    dead_letters: Arc<dyn DeadLetterStore>,
    broadcaster: Broadcaster,
    standings: Arc<StandingsService>,
    scheduler: RecomputeScheduler,
    config: StandingsConfig,
}

impl JudgeResultIngestor {
    pub fn new(
        store: Arc<dyn ContestStore>,
        locks: Arc<dyn LockProvider>,
        dead_letters: Arc<dyn DeadLetterStore>,
        broadcaster: Broadcaster,
        standings: Arc<StandingsService>,
        scheduler: RecomputeScheduler,
        config: StandingsConfig,
    ) -> Self {
        Self {
            store,
            locks,
            dead_letters,
            broadcaster,
            standings,
            scheduler,
            config,
        }
    }

    /// Ingest a verdict delivered by the judge
    pub async fn ingest(
        &self,
        submission_id: Uuid,
        result: JudgeResult,
    ) -> AppResult<IngestOutcome> {
        self.ingest_attempt(submission_id, result, 0).await
    }

    /// Ingest a verdict, tagging any dead letter with the replay `attempt`
    pub async fn ingest_attempt(
        &self,
        submission_id: Uuid,
        result: JudgeResult,
        attempt: u32,
    ) -> AppResult<IngestOutcome> {
        let lock_key = keys::judge_result_lock(&submission_id);
        let token = Uuid::new_v4().to_string();

        let acquired = match self
            .locks
            .try_acquire(&lock_key, &token, self.config.lock_ttl)
            .await
        {
            Ok(acquired) => acquired,
            Err(e) => {
                self.dead_letter(submission_id, result, &e, attempt).await;
                return Ok(IngestOutcome::DeadLettered);
            }
        };
        if !acquired {
            tracing::debug!(
                submission_id = %submission_id,
                "Verdict already being processed, skipping"
            );
            return Ok(IngestOutcome::LockContended);
        }

        let outcome = self.process(submission_id, &result).await;

        match self.locks.release(&lock_key, &token).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(
                    submission_id = %submission_id,
                    "Processing lock expired before release"
                );
            }
            Err(e) => {
                tracing::warn!(
                    submission_id = %submission_id,
                    error = %e,
                    "Failed to release processing lock"
                );
            }
        }

        match outcome {
            Ok(outcome) => Ok(outcome),
            Err(AppError::ContestNotFound(contest_id)) => {
                Err(AppError::ContestNotFound(contest_id))
            }
            Err(e) => {
                self.dead_letter(submission_id, result, &e, attempt).await;
                Ok(IngestOutcome::DeadLettered)
            }
        }
    }

    async fn process(&self, submission_id: Uuid, result: &JudgeResult) -> AppResult<IngestOutcome> {
        let Some(submission) = self.store.find_by_submission(&submission_id).await? else {
            tracing::debug!(submission_id = %submission_id, "Not a contest submission");
            return Ok(IngestOutcome::NotAContestSubmission);
        };

        let contest = self
            .store
            .find_contest(&submission.contest_id)
            .await?
            .ok_or(AppError::ContestNotFound(submission.contest_id))?;

        let now = now_utc();
        if contest.is_past_grace(now, self.config.late_grace_minutes) {
            tracing::info!(
                submission_id = %submission_id,
                contest_id = %contest.id,
                "Dropping verdict received after contest end"
            );
            return Ok(IngestOutcome::LateVerdict);
        }

        if submission.is_processed {
            tracing::debug!(submission_id = %submission_id, "Verdict already applied");
            return Ok(IngestOutcome::AlreadyProcessed);
        }

        if !result.status.is_final() {
            tracing::debug!(
                submission_id = %submission_id,
                status = ?result.status,
                "Ignoring non-final verdict"
            );
            return Ok(IngestOutcome::NotFinal);
        }

        let update = self.build_update(&contest, &submission, result, now).await?;
        let applied = match self.store.apply_verdict(&update).await? {
            ApplyOutcome::Applied(applied) => applied,
            ApplyOutcome::AlreadyProcessed => return Ok(IngestOutcome::AlreadyProcessed),
        };

        tracing::info!(
            submission_id = %submission_id,
            contest_id = %contest.id,
            verdict = %update.verdict,
            points = update.points,
            penalty = update.penalty,
            "Verdict applied"
        );

        self.after_commit(&contest, &applied).await;

        Ok(IngestOutcome::Applied(applied))
    }

    /// Verdict tag, score and penalty for a final verdict
    async fn build_update(
        &self,
        contest: &Contest,
        submission: &ContestSubmission,
        result: &JudgeResult,
        now: DateTime<Utc>,
    ) -> AppResult<VerdictUpdate> {
        let verdict = result.status.tag();
        let is_accepted = verdict == VerdictTag::Ac;

        let first_accepted =
            is_accepted && !self.store.has_earlier_accepted(submission).await?;
        let (points, penalty) = if first_accepted {
            let max_points = contest
                .problem(&submission.problem_id)
                .map_or(DEFAULT_PROBLEM_POINTS, |p| p.max_points);
            let scored = scoring::score(
                contest.scoring_system,
                submission.attempt_number,
                submission.submission_time,
                contest.penalty_per_wrong,
                max_points,
            );
            (scored.score, scored.penalty)
        } else {
            (0, 0)
        };

        Ok(VerdictUpdate {
            contest_submission_id: submission.id,
            contest_id: contest.id,
            verdict,
            is_accepted,
            points,
            penalty,
            processed_at: now,
        })
    }

    /// Side effects of a committed verdict. None of these can undo it.
    async fn after_commit(&self, contest: &Contest, applied: &ContestSubmission) {
        if let Err(e) = self.standings.invalidate(contest.id).await {
            tracing::warn!(
                contest_id = %contest.id,
                error = %e,
                "Failed to invalidate standings cache"
            );
        }
        self.scheduler.trigger(contest.id);

        self.broadcaster
            .emit(
                Room::Submission(applied.submission_id),
                RealtimeEvent::SubmissionResult(SubmissionResultEvent {
                    submission_id: applied.submission_id,
                    contest_submission_id: applied.id,
                    verdict: applied.verdict.unwrap_or(VerdictTag::Ie),
                    score: applied.points,
                    penalty: applied.penalty,
                }),
            )
            .await;

        if applied.is_accepted {
            self.announce_first_blood(contest, applied).await;
        }
    }

    async fn announce_first_blood(&self, contest: &Contest, applied: &ContestSubmission) {
        let claim = FirstBloodClaim {
            contest_id: contest.id,
            problem_id: applied.problem_id,
            problem_label: applied.problem_label.clone(),
            user_id: applied.user_id,
            submission_id: applied.submission_id,
            submission_time: applied.submission_time,
        };

        match self.store.claim_first_blood(&claim).await {
            Ok(true) => {}
            Ok(false) => return,
            Err(e) => {
                tracing::warn!(
                    contest_id = %contest.id,
                    problem_id = %claim.problem_id,
                    error = %e,
                    "First blood claim failed"
                );
                return;
            }
        }

        if contest.freeze_time_minutes > 0 && applied.submitted_at >= contest.freeze_start() {
            tracing::info!(
                contest_id = %contest.id,
                problem = %claim.problem_label,
                "First blood inside freeze window, not announced"
            );
            return;
        }

        tracing::info!(
            contest_id = %contest.id,
            problem = %claim.problem_label,
            user_id = %claim.user_id,
            "First blood"
        );

        self.broadcaster
            .emit(
                Room::Contest(contest.id),
                RealtimeEvent::FirstBlood(FirstBloodEvent {
                    contest_id: claim.contest_id,
                    problem_id: claim.problem_id,
                    problem_label: claim.problem_label,
                    user_id: claim.user_id,
                    submission_time: claim.submission_time,
                }),
            )
            .await;
    }

    async fn dead_letter(
        &self,
        submission_id: Uuid,
        result: JudgeResult,
        error: &AppError,
        attempt: u32,
    ) {
        let record = DeadLetterRecord::new(submission_id, result, error.to_string(), attempt);

        tracing::error!(
            submission_id = %submission_id,
            attempt,
            error = %error,
            "Failed to apply verdict, moving to dead letter"
        );

        if let Err(e) = self.dead_letters.push(&record).await {
            let payload = serde_json::to_string(&record).unwrap_or_default();
            tracing::error!(
                submission_id = %submission_id,
                error = %e,
                record = %payload,
                "Failed to write dead letter"
            );
        }
    }
}
