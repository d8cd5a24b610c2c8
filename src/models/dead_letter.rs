//! Dead-letter records for verdicts that failed to apply

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::JudgeResult;

/// A verdict whose transaction failed, kept for inspection and replay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetterRecord {
    pub submission_id: Uuid,
    pub verdict: JudgeResult,
    pub error: String,
    pub timestamp: DateTime<Utc>,
    /// Replays already attempted for this verdict
    #[serde(default)]
    pub attempt: u32,
}

impl DeadLetterRecord {
    pub fn new(
        submission_id: Uuid,
        verdict: JudgeResult,
        error: impl Into<String>,
        attempt: u32,
    ) -> Self {
        Self {
            submission_id,
            verdict,
            error: error.into(),
            timestamp: Utc::now(),
            attempt,
        }
    }

    /// Day bucket (`YYYY-MM-DD`) the record is filed under
    pub fn day(&self) -> String {
        day_key(self.timestamp.date_naive())
    }
}

/// Format a date as a dead-letter day bucket
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
