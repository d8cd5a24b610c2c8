//! Internal handler implementations

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};

use super::{
    request::{DeadLetterQuery, JudgeCallbackRequest},
    response::{CallbackAccepted, DeadLettersResponse},
};
use crate::{
    error::{AppError, AppResult},
    models::day_key,
    state::AppState,
    utils::{now_utc, parse_day},
};

/// Accept a verdict and ingest it in the background
pub async fn judge_callback(
    State(state): State<AppState>,
    Json(payload): Json<JudgeCallbackRequest>,
) -> AppResult<(StatusCode, Json<CallbackAccepted>)> {
    let (submission_id, result) = payload.into_parts()?;

    let ingestor = state.ingestor();
    tokio::spawn(async move {
        match ingestor.ingest(submission_id, result).await {
            Ok(outcome) => {
                tracing::debug!(
                    submission_id = %submission_id,
                    outcome = ?outcome,
                    "Judge callback handled"
                );
            }
            Err(e) => {
                tracing::error!(
                    submission_id = %submission_id,
                    error = %e,
                    "Judge callback failed"
                );
            }
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(CallbackAccepted {
            submission_id,
            status: "queued",
        }),
    ))
}

/// Dead letters parked on a day
pub async fn list_dead_letters(
    State(state): State<AppState>,
    Query(query): Query<DeadLetterQuery>,
) -> AppResult<Json<DeadLettersResponse>> {
    let day = match query.day {
        Some(raw) => {
            let date = parse_day(&raw).ok_or_else(|| {
                AppError::Validation(format!("day must be YYYY-MM-DD, got {}", raw))
            })?;
            day_key(date)
        }
        None => day_key(now_utc().date_naive()),
    };

    let records = state.dead_letters().list(&day).await?;

    Ok(Json(DeadLettersResponse {
        day: Some(day),
        total: records.len(),
        records,
    }))
}

/// Dead letters that ran out of replay attempts
pub async fn list_exhausted(State(state): State<AppState>) -> AppResult<Json<DeadLettersResponse>> {
    let records = state.dead_letters().list_exhausted().await?;

    Ok(Json(DeadLettersResponse {
        day: None,
        total: records.len(),
        records,
    }))
}
