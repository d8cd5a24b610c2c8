//! Contest standings handlers

mod handler;
pub mod request;
pub mod response;

pub use handler::*;
pub use request::*;
pub use response::*;

use axum::{Router, routing::get};

use crate::state::AppState;

/// Contest routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(handler::get_contest))
        .route("/{id}/standings", get(handler::get_standings))
        .route("/{id}/events", get(handler::contest_events))
}
