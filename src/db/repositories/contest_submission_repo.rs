//! Contest submission repository

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{ContestSubmission, ContestSubmissionRow, VerdictUpdate},
};

/// Repository for contest submission database operations
pub struct ContestSubmissionRepository;

impl ContestSubmissionRepository {
    /// Find the contest record of an underlying submission
    pub async fn find_by_submission_id(
        pool: &PgPool,
        submission_id: &Uuid,
    ) -> AppResult<Option<ContestSubmission>> {
        let row = sqlx::query_as::<_, ContestSubmissionRow>(
            r#"SELECT * FROM contest_submissions WHERE submission_id = $1"#,
        )
        .bind(submission_id)
        .fetch_optional(pool)
        .await?;

        row.map(ContestSubmission::try_from).transpose()
    }

    /// Check for an accepted record ordered before `submission` for the same user and problem
    pub async fn has_earlier_accepted(
        pool: &PgPool,
        submission: &ContestSubmission,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM contest_submissions
                WHERE contest_id = $1
                  AND user_id = $2
                  AND problem_id = $3
                  AND id <> $4
                  AND is_processed
                  AND is_accepted
                  AND (submission_time, attempt_number) < ($5, $6)
            )
            "#,
        )
        .bind(submission.contest_id)
        .bind(submission.user_id)
        .bind(submission.problem_id)
        .bind(submission.id)
        .bind(submission.submission_time)
        .bind(submission.attempt_number)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Write a verdict if the record is still unprocessed.
    ///
    /// Returns `None` when another writer already processed it.
    pub async fn mark_processed(
        conn: &mut PgConnection,
        update: &VerdictUpdate,
    ) -> AppResult<Option<ContestSubmission>> {
        let row = sqlx::query_as::<_, ContestSubmissionRow>(
            r#"
            UPDATE contest_submissions
            SET verdict = $2,
                is_accepted = $3,
                points = $4,
                penalty = $5,
                is_processed = TRUE,
                processed_at = $6
            WHERE id = $1 AND is_processed = FALSE
            RETURNING *
            "#,
        )
        .bind(update.contest_submission_id)
        .bind(update.verdict.as_str())
        .bind(update.is_accepted)
        .bind(update.points)
        .bind(update.penalty)
        .bind(update.processed_at)
        .fetch_optional(conn)
        .await?;

        row.map(ContestSubmission::try_from).transpose()
    }

    /// All records of a contest, oldest first
    pub async fn list_by_contest(
        pool: &PgPool,
        contest_id: &Uuid,
    ) -> AppResult<Vec<ContestSubmission>> {
        let rows = sqlx::query_as::<_, ContestSubmissionRow>(
            r#"
            SELECT *
            FROM contest_submissions
            WHERE contest_id = $1
            ORDER BY submission_time, attempt_number, submitted_at
            "#,
        )
        .bind(contest_id)
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(ContestSubmission::try_from).collect()
    }
}
