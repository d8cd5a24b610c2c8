//! Contest model

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    constants::scoring_systems,
    error::{AppError, AppResult},
};

/// Competitive scoring system of a contest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoringSystem {
    #[serde(rename = "ICPC")]
    Icpc,
    #[serde(rename = "IOI")]
    Ioi,
    #[serde(rename = "AtCoder")]
    AtCoder,
}

impl ScoringSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Icpc => scoring_systems::ICPC,
            Self::Ioi => scoring_systems::IOI,
            Self::AtCoder => scoring_systems::ATCODER,
        }
    }
}

impl fmt::Display for ScoringSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoringSystem {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            scoring_systems::ICPC => Ok(Self::Icpc),
            scoring_systems::IOI => Ok(Self::Ioi),
            scoring_systems::ATCODER => Ok(Self::AtCoder),
            other => Err(AppError::InvalidInput(format!(
                "Unknown scoring system '{}'",
                other
            ))),
        }
    }
}

/// Contest database row
#[derive(Debug, Clone, FromRow)]
pub struct ContestRow {
    pub id: Uuid,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub registration_deadline: Option<DateTime<Utc>>,
    pub scoring_system: String,
    pub penalty_per_wrong: i64,
    pub freeze_time_minutes: i64,
    pub is_published: bool,
    pub is_visible: bool,
    pub total_submissions: i64,
    pub accepted_submissions: i64,
}

/// Problem slot inside a contest
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ContestProblem {
    pub problem_id: Uuid,
    /// Single uppercase letter, unique within the contest
    pub label: String,
    pub max_points: i64,
}

/// Contest with its problem set and participants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contest {
    pub id: Uuid,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub registration_deadline: Option<DateTime<Utc>>,
    pub scoring_system: ScoringSystem,
    /// Ordered by position in the contest
    pub problems: Vec<ContestProblem>,
    pub penalty_per_wrong: i64,
    /// Minutes before the end during which public standings are frozen
    pub freeze_time_minutes: i64,
    pub is_published: bool,
    pub is_visible: bool,
    pub participants: Vec<Uuid>,
    pub total_submissions: i64,
    pub accepted_submissions: i64,
}

impl Contest {
    /// Assemble a contest from its row and child collections
    pub fn from_parts(
        row: ContestRow,
        problems: Vec<ContestProblem>,
        participants: Vec<Uuid>,
    ) -> AppResult<Self> {
        Ok(Self {
            id: row.id,
            title: row.title,
            start_time: row.start_time,
            end_time: row.end_time,
            registration_deadline: row.registration_deadline,
            scoring_system: row.scoring_system.parse()?,
            problems,
            penalty_per_wrong: row.penalty_per_wrong,
            freeze_time_minutes: row.freeze_time_minutes,
            is_published: row.is_published,
            is_visible: row.is_visible,
            participants,
            total_submissions: row.total_submissions,
            accepted_submissions: row.accepted_submissions,
        })
    }

    /// Get status of the contest at `now`
    pub fn status(&self, now: DateTime<Utc>) -> ContestStatus {
        if !self.is_published {
            ContestStatus::Draft
        } else if now < self.start_time {
            ContestStatus::Upcoming
        } else if now <= self.end_time {
            ContestStatus::Running
        } else {
            ContestStatus::Ended
        }
    }

    /// Time until start while upcoming, until end while running, zero otherwise
    pub fn time_left(&self, now: DateTime<Utc>) -> Duration {
        match self.status(now) {
            ContestStatus::Upcoming => self.start_time - now,
            ContestStatus::Running => self.end_time - now,
            ContestStatus::Draft | ContestStatus::Ended => Duration::zero(),
        }
    }

    /// Check if registration is open at `now`
    pub fn can_register(&self, now: DateTime<Utc>) -> bool {
        if !self.is_published || now > self.end_time {
            return false;
        }
        self.registration_deadline.is_none_or(|deadline| now <= deadline)
    }

    /// Check if the contest is listed to the public at `now`
    pub fn is_public(&self, now: DateTime<Utc>) -> bool {
        self.is_visible && self.status(now) != ContestStatus::Draft
    }

    /// Instant from which accepted results are hidden from public standings
    pub fn freeze_start(&self) -> DateTime<Utc> {
        self.end_time - Duration::minutes(self.freeze_time_minutes)
    }

    /// Check if public standings are frozen at `now`
    pub fn is_frozen_at(&self, now: DateTime<Utc>) -> bool {
        self.freeze_time_minutes > 0 && now >= self.freeze_start() && now <= self.end_time
    }

    /// Check if a verdict arriving at `now` is past the end-of-contest grace
    pub fn is_past_grace(&self, now: DateTime<Utc>, grace_minutes: i64) -> bool {
        now > self.end_time + Duration::minutes(grace_minutes)
    }

    /// Look up the contest slot of a problem
    pub fn problem(&self, problem_id: &Uuid) -> Option<&ContestProblem> {
        self.problems.iter().find(|p| p.problem_id == *problem_id)
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Check structural invariants of the problem set
    pub fn validate(&self) -> AppResult<()> {
        let mut seen = HashSet::new();

        for problem in &self.problems {
            let mut chars = problem.label.chars();
            let valid = matches!(
                (chars.next(), chars.next()),
                (Some(c), None) if c.is_ascii_uppercase()
            );
            if !valid {
                return Err(AppError::Validation(format!(
                    "Problem label '{}' must be a single uppercase letter",
                    problem.label
                )));
            }
            if !seen.insert(problem.label.as_str()) {
                return Err(AppError::Validation(format!(
                    "Problem label '{}' is used more than once",
                    problem.label
                )));
            }
        }

        Ok(())
    }
}

/// Contest status, always derived from the persisted fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContestStatus {
    Draft,
    Upcoming,
    Running,
    Ended,
}

impl fmt::Display for ContestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Upcoming => write!(f, "upcoming"),
            Self::Running => write!(f, "running"),
            Self::Ended => write!(f, "ended"),
        }
    }
}
