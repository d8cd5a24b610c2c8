//! Persisted standings snapshots

use sqlx::{PgPool, types::Json};
use uuid::Uuid;

use crate::{error::AppResult, models::StandingsSnapshot};

/// Repository for the last computed ranking of each contest
pub struct StandingsRepository;

impl StandingsRepository {
    /// Upsert a snapshot unless a newer one is already stored
    pub async fn upsert(pool: &PgPool, snapshot: &StandingsSnapshot) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO standings_snapshots (contest_id, payload, last_updated)
            VALUES ($1, $2, $3)
            ON CONFLICT (contest_id) DO UPDATE
            SET payload = EXCLUDED.payload,
                last_updated = EXCLUDED.last_updated
            WHERE standings_snapshots.last_updated <= EXCLUDED.last_updated
            "#,
        )
        .bind(snapshot.contest_id)
        .bind(Json(snapshot))
        .bind(snapshot.last_updated)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_contest(
        pool: &PgPool,
        contest_id: &Uuid,
    ) -> AppResult<Option<StandingsSnapshot>> {
        let payload: Option<Json<StandingsSnapshot>> = sqlx::query_scalar(
            r#"SELECT payload FROM standings_snapshots WHERE contest_id = $1"#,
        )
        .bind(contest_id)
        .fetch_optional(pool)
        .await?;

        Ok(payload.map(|Json(snapshot)| snapshot))
    }
}
