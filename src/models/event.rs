//! Real-time events and subscription rooms

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{RankingEntry, VerdictTag};

/// Subscription room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Room {
    Contest(Uuid),
    Submission(Uuid),
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contest(id) => write!(f, "contest_{}", id),
            Self::Submission(id) => write!(f, "submission_{}", id),
        }
    }
}

/// Verdict applied to a single submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResultEvent {
    pub submission_id: Uuid,
    pub contest_submission_id: Uuid,
    pub verdict: VerdictTag,
    pub score: i64,
    pub penalty: i64,
}

/// Top of the leaderboard after a recompute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingsUpdateEvent {
    pub contest_id: Uuid,
    pub rankings: Vec<RankingEntry>,
    pub last_updated: DateTime<Utc>,
    pub total_participants: usize,
    pub is_frozen: bool,
}

/// First accepted solve of a problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirstBloodEvent {
    pub contest_id: Uuid,
    pub problem_id: Uuid,
    pub problem_label: String,
    pub user_id: Uuid,
    pub submission_time: i64,
}

/// Event pushed to room subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum RealtimeEvent {
    SubmissionResult(SubmissionResultEvent),
    StandingsUpdate(StandingsUpdateEvent),
    FirstBlood(FirstBloodEvent),
}

impl RealtimeEvent {
    /// Event name as seen by subscribers
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SubmissionResult(_) => "submission_result",
            Self::StandingsUpdate(_) => "standings_update",
            Self::FirstBlood(_) => "first_blood",
        }
    }
}
