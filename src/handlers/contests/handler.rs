//! Contest handler implementations

use axum::{
    Json,
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt, stream};
use uuid::Uuid;

use super::{request::StandingsQuery, response::ContestSummary};
use crate::{
    error::AppResult,
    handlers::events::{room_stream, to_sse_event},
    models::{RealtimeEvent, Room, StandingsPage},
    state::AppState,
    utils::now_utc,
};

/// Public summary of a contest with its derived status
pub async fn get_contest(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ContestSummary>> {
    let contest = state.standings().public_contest(id).await?;
    Ok(Json(ContestSummary::from_contest(&contest, now_utc())))
}

/// Public standings, frozen while the contest is inside its freeze window.
/// Drafts and hidden contests answer 404.
pub async fn get_standings(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<StandingsQuery>,
) -> AppResult<Json<StandingsPage>> {
    let page = state
        .standings()
        .get_public_standings(id, query.page(), query.limit())
        .await?;

    Ok(Json(page))
}

/// Live events of a contest room.
///
/// The stream opens with the current top of the board so late joiners do not
/// wait for the next recompute.
pub async fn contest_events(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    let rx = state.hub().subscribe(Room::Contest(id))?;
    let opening = RealtimeEvent::StandingsUpdate(state.standings().public_update(id).await?);

    tracing::debug!(contest_id = %id, "Contest event stream opened");

    let events = stream::once(async move { to_sse_event(&opening) }).chain(room_stream(rx));
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
