//! First blood repository

use sqlx::PgPool;
use uuid::Uuid;

use crate::{error::AppResult, models::FirstBloodClaim};

/// Repository for first accepted solves per problem
pub struct FirstBloodRepository;

impl FirstBloodRepository {
    /// Record `claim` if it is the earliest accepted solve of its problem.
    ///
    /// A single conditional upsert, so concurrent claims cannot both win.
    pub async fn claim(pool: &PgPool, claim: &FirstBloodClaim) -> AppResult<bool> {
        let winner: Option<Uuid> = sqlx::query_scalar(
            r#"
            INSERT INTO first_bloods
                (contest_id, problem_id, user_id, submission_id, submission_time, claimed_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (contest_id, problem_id) DO UPDATE
            SET user_id = EXCLUDED.user_id,
                submission_id = EXCLUDED.submission_id,
                submission_time = EXCLUDED.submission_time,
                claimed_at = EXCLUDED.claimed_at
            WHERE first_bloods.submission_time > EXCLUDED.submission_time
            RETURNING submission_id
            "#,
        )
        .bind(claim.contest_id)
        .bind(claim.problem_id)
        .bind(claim.user_id)
        .bind(claim.submission_id)
        .bind(claim.submission_time)
        .fetch_optional(pool)
        .await?;

        Ok(winner.is_some())
    }
}
