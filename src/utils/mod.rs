//! Utility functions

pub mod retry;
pub mod time;

pub use retry::calculate_backoff;
pub use time::{now_utc, parse_day, recent_days};
