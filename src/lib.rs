//! AlgoJudge Standings - Contest Scoring and Real-Time Standings Engine
//!
//! This library turns judge verdicts for contest submissions into scores,
//! penalties and rankings, and pushes the results to connected viewers.
//!
//! # Features
//!
//! - ICPC, IOI and AtCoder scoring
//! - Exactly-once verdict ingestion under a per-submission lock
//! - First-blood detection
//! - Scoreboard freeze with a frozen public projection
//! - Paginated, cached standings with debounced recomputation
//! - Dead-letter parking and replay of failed verdicts
//!
//! # Architecture
//!
//! The application follows a layered architecture:
//! - **Handlers**: HTTP and SSE adapters (thin layer)
//! - **Services**: Scoring, ranking and ingestion logic
//! - **Store / Cache / Realtime**: Trait seams over Postgres, Redis and room fan-out
//! - **Models**: Domain models and DTOs

pub mod cache;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod realtime;
pub mod services;
pub mod state;
pub mod utils;

#[cfg(test)]
mod test_utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, AppResult};
pub use services::{Engine, EngineDeps};
pub use state::AppState;
