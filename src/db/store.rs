//! Persistence seam for the scoring engine
//!
//! Services talk to [`ContestStore`]; [`PgContestStore`] is the PostgreSQL
//! implementation wired in by `main`.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    db::repositories::{
        ContestRepository, ContestSubmissionRepository, FirstBloodRepository,
        StandingsRepository,
    },
    error::AppResult,
    models::{
        ApplyOutcome, Contest, ContestSubmission, FirstBloodClaim, StandingsSnapshot, VerdictUpdate,
    },
};

/// Durable contest state read and written by the engine
#[async_trait]
pub trait ContestStore: Send + Sync {
    /// Contest with its problems and participants
    async fn find_contest(&self, contest_id: &Uuid) -> AppResult<Option<Contest>>;

    /// Contest record linked to an underlying submission
    async fn find_by_submission(&self, submission_id: &Uuid)
    -> AppResult<Option<ContestSubmission>>;

    /// Whether the same user already has an accepted record ordered before `submission`
    async fn has_earlier_accepted(&self, submission: &ContestSubmission) -> AppResult<bool>;

    /// Persist a verdict and bump contest counters in one transaction.
    ///
    /// Only an unprocessed record is updated.
    async fn apply_verdict(&self, update: &VerdictUpdate) -> AppResult<ApplyOutcome>;

    /// Every contest record of a contest, processed or not
    async fn list_by_contest(&self, contest_id: &Uuid) -> AppResult<Vec<ContestSubmission>>;

    /// Record a first accepted solve, returning whether this claim won
    async fn claim_first_blood(&self, claim: &FirstBloodClaim) -> AppResult<bool>;

    /// Store the latest computed ranking of a contest
    async fn save_snapshot(&self, snapshot: &StandingsSnapshot) -> AppResult<()>;

    async fn load_snapshot(&self, contest_id: &Uuid) -> AppResult<Option<StandingsSnapshot>>;
}

/// PostgreSQL-backed [`ContestStore`]
#[derive(Clone)]
pub struct PgContestStore {
    pool: PgPool,
}

impl PgContestStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ContestStore for PgContestStore {
    async fn find_contest(&self, contest_id: &Uuid) -> AppResult<Option<Contest>> {
        ContestRepository::find_by_id(&self.pool, contest_id).await
    }

    async fn find_by_submission(
        &self,
        submission_id: &Uuid,
    ) -> AppResult<Option<ContestSubmission>> {
        ContestSubmissionRepository::find_by_submission_id(&self.pool, submission_id).await
    }

    async fn has_earlier_accepted(&self, submission: &ContestSubmission) -> AppResult<bool> {
        ContestSubmissionRepository::has_earlier_accepted(&self.pool, submission).await
    }

    async fn apply_verdict(&self, update: &VerdictUpdate) -> AppResult<ApplyOutcome> {
        let mut tx = self.pool.begin().await?;

        let Some(applied) = ContestSubmissionRepository::mark_processed(&mut *tx, update).await?
        else {
            tx.rollback().await?;
            return Ok(ApplyOutcome::AlreadyProcessed);
        };

        ContestRepository::increment_counters(&mut *tx, &update.contest_id, update.is_accepted)
            .await?;

        tx.commit().await?;

        Ok(ApplyOutcome::Applied(applied))
    }

    async fn list_by_contest(&self, contest_id: &Uuid) -> AppResult<Vec<ContestSubmission>> {
        ContestSubmissionRepository::list_by_contest(&self.pool, contest_id).await
    }

    async fn claim_first_blood(&self, claim: &FirstBloodClaim) -> AppResult<bool> {
        FirstBloodRepository::claim(&self.pool, claim).await
    }

    async fn save_snapshot(&self, snapshot: &StandingsSnapshot) -> AppResult<()> {
        StandingsRepository::upsert(&self.pool, snapshot).await
    }

    async fn load_snapshot(&self, contest_id: &Uuid) -> AppResult<Option<StandingsSnapshot>> {
        StandingsRepository::find_by_contest(&self.pool, contest_id).await
    }
}
