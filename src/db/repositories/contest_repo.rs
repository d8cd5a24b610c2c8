//! Contest repository

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Contest, ContestProblem, ContestRow},
};

/// Repository for contest database operations
pub struct ContestRepository;

impl ContestRepository {
    /// Find contest by ID, together with its problems and participants
    pub async fn find_by_id(pool: &PgPool, id: &Uuid) -> AppResult<Option<Contest>> {
        let row = sqlx::query_as::<_, ContestRow>(
            r#"
            SELECT id, title, start_time, end_time, registration_deadline, scoring_system,
                   penalty_per_wrong, freeze_time_minutes, is_published, is_visible,
                   total_submissions, accepted_submissions
            FROM contests
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let problems = Self::list_problems(pool, id).await?;
        let participants = Self::list_participants(pool, id).await?;

        Contest::from_parts(row, problems, participants).map(Some)
    }

    /// Problems of a contest in display order
    pub async fn list_problems(pool: &PgPool, contest_id: &Uuid) -> AppResult<Vec<ContestProblem>> {
        let problems = sqlx::query_as::<_, ContestProblem>(
            r#"
            SELECT problem_id, label, max_points
            FROM contest_problems
            WHERE contest_id = $1
            ORDER BY position, label
            "#,
        )
        .bind(contest_id)
        .fetch_all(pool)
        .await?;

        Ok(problems)
    }

    /// Registered participants in registration order
    pub async fn list_participants(pool: &PgPool, contest_id: &Uuid) -> AppResult<Vec<Uuid>> {
        let participants: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT user_id
            FROM contest_participants
            WHERE contest_id = $1
            ORDER BY registered_at
            "#,
        )
        .bind(contest_id)
        .fetch_all(pool)
        .await?;

        Ok(participants)
    }

    /// Bump aggregate counters inside the caller's transaction
    pub async fn increment_counters(
        conn: &mut PgConnection,
        contest_id: &Uuid,
        accepted: bool,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE contests
            SET total_submissions = total_submissions + 1,
                accepted_submissions = accepted_submissions + $2,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(contest_id)
        .bind(if accepted { 1_i64 } else { 0_i64 })
        .execute(conn)
        .await?;

        Ok(())
    }
}
