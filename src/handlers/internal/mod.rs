//! Internal endpoints: judge callbacks and dead-letter inspection

mod handler;
pub mod request;
pub mod response;

pub use handler::*;
pub use request::*;
pub use response::*;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Internal routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/judge-callback", post(handler::judge_callback))
        .route("/dead-letters", get(handler::list_dead_letters))
        .route("/dead-letters/exhausted", get(handler::list_exhausted))
}
