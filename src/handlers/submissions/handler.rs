//! Submission handler implementations

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use uuid::Uuid;

use crate::{error::AppResult, handlers::events::room_stream, models::Room, state::AppState};

/// Verdict events of one submission
pub async fn submission_events(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    let rx = state.hub().subscribe(Room::Submission(id))?;
    tracing::debug!(submission_id = %id, "Submission event stream opened");

    Ok(Sse::new(room_stream(rx)).keep_alive(KeepAlive::default()))
}
