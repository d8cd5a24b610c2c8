//! Contest response DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Contest, ContestStatus, ScoringSystem};

/// Public contest summary
#[derive(Debug, Serialize)]
pub struct ContestSummary {
    pub id: Uuid,
    pub title: String,
    pub scoring_system: ScoringSystem,
    pub status: ContestStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub registration_deadline: Option<DateTime<Utc>>,
    pub time_left_seconds: i64,
    pub can_register: bool,
    pub is_frozen: bool,
    pub participant_count: usize,
    pub problem_count: usize,
}

impl ContestSummary {
    pub fn from_contest(contest: &Contest, now: DateTime<Utc>) -> Self {
        Self {
            id: contest.id,
            title: contest.title.clone(),
            scoring_system: contest.scoring_system,
            status: contest.status(now),
            start_time: contest.start_time,
            end_time: contest.end_time,
            registration_deadline: contest.registration_deadline,
            time_left_seconds: contest.time_left(now).num_seconds(),
            can_register: contest.can_register(now),
            is_frozen: contest.is_frozen_at(now),
            participant_count: contest.participant_count(),
            problem_count: contest.problems.len(),
        }
    }
}
