//! Contest submission and judge verdict models

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::AppError;

/// Status reported by the execution service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JudgeStatus {
    #[serde(rename = "Accepted")]
    Accepted,
    #[serde(rename = "Wrong Answer")]
    WrongAnswer,
    #[serde(rename = "Time Limit Exceeded")]
    TimeLimitExceeded,
    #[serde(rename = "Memory Limit Exceeded")]
    MemoryLimitExceeded,
    #[serde(rename = "Runtime Error")]
    RuntimeError,
    #[serde(rename = "Compilation Error")]
    CompilationError,
    #[serde(rename = "Internal Error")]
    InternalError,
    #[serde(rename = "Pending")]
    Pending,
}

impl JudgeStatus {
    /// Normalized tag stored on the contest submission
    pub fn tag(&self) -> VerdictTag {
        match self {
            Self::Accepted => VerdictTag::Ac,
            Self::WrongAnswer => VerdictTag::Wa,
            Self::TimeLimitExceeded => VerdictTag::Tle,
            Self::MemoryLimitExceeded => VerdictTag::Mle,
            Self::RuntimeError => VerdictTag::Re,
            Self::CompilationError => VerdictTag::Ce,
            Self::InternalError => VerdictTag::Ie,
            Self::Pending => VerdictTag::Pending,
        }
    }

    /// A final verdict can be applied; a pending one will be followed by another callback
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Verdict payload delivered by the execution service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgeResult {
    pub status: JudgeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_used: Option<i64>,
}

impl JudgeResult {
    pub fn new(status: JudgeStatus) -> Self {
        Self {
            status,
            execution_time: None,
            memory_used: None,
        }
    }
}

/// Normalized verdict tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerdictTag {
    #[serde(rename = "AC")]
    Ac,
    #[serde(rename = "WA")]
    Wa,
    #[serde(rename = "TLE")]
    Tle,
    #[serde(rename = "MLE")]
    Mle,
    #[serde(rename = "RE")]
    Re,
    #[serde(rename = "CE")]
    Ce,
    #[serde(rename = "IE")]
    Ie,
    #[serde(rename = "Pending")]
    Pending,
}

impl VerdictTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ac => "AC",
            Self::Wa => "WA",
            Self::Tle => "TLE",
            Self::Mle => "MLE",
            Self::Re => "RE",
            Self::Ce => "CE",
            Self::Ie => "IE",
            Self::Pending => "Pending",
        }
    }
}

impl fmt::Display for VerdictTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerdictTag {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AC" => Ok(Self::Ac),
            "WA" => Ok(Self::Wa),
            "TLE" => Ok(Self::Tle),
            "MLE" => Ok(Self::Mle),
            "RE" => Ok(Self::Re),
            "CE" => Ok(Self::Ce),
            "IE" => Ok(Self::Ie),
            "Pending" => Ok(Self::Pending),
            other => Err(AppError::InvalidInput(format!("Unknown verdict '{}'", other))),
        }
    }
}

/// Contest submission database row
#[derive(Debug, Clone, FromRow)]
pub struct ContestSubmissionRow {
    pub id: Uuid,
    pub contest_id: Uuid,
    pub user_id: Uuid,
    pub problem_id: Uuid,
    pub problem_label: String,
    pub submission_id: Uuid,
    pub submission_time: i64,
    pub submitted_at: DateTime<Utc>,
    pub attempt_number: i32,
    pub verdict: Option<String>,
    pub is_accepted: bool,
    pub points: i64,
    pub penalty: i64,
    pub is_processed: bool,
    pub processed_at: Option<DateTime<Utc>>,
}

/// Contest-side record of one judged submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContestSubmission {
    pub id: Uuid,
    pub contest_id: Uuid,
    pub user_id: Uuid,
    pub problem_id: Uuid,
    pub problem_label: String,
    /// The underlying judged submission (1:1)
    pub submission_id: Uuid,
    /// Whole minutes elapsed since contest start
    pub submission_time: i64,
    pub submitted_at: DateTime<Utc>,
    /// 1-based count of this user's submissions to this problem
    pub attempt_number: i32,
    pub verdict: Option<VerdictTag>,
    pub is_accepted: bool,
    pub points: i64,
    pub penalty: i64,
    pub is_processed: bool,
    pub processed_at: Option<DateTime<Utc>>,
}

impl ContestSubmission {
    /// Ordering used everywhere submissions of one contest are replayed
    pub fn order_key(&self) -> (i64, i32, DateTime<Utc>) {
        (self.submission_time, self.attempt_number, self.submitted_at)
    }
}

impl TryFrom<ContestSubmissionRow> for ContestSubmission {
    type Error = AppError;

    fn try_from(row: ContestSubmissionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            contest_id: row.contest_id,
            user_id: row.user_id,
            problem_id: row.problem_id,
            problem_label: row.problem_label,
            submission_id: row.submission_id,
            submission_time: row.submission_time,
            submitted_at: row.submitted_at,
            attempt_number: row.attempt_number,
            verdict: row.verdict.as_deref().map(str::parse).transpose()?,
            is_accepted: row.is_accepted,
            points: row.points,
            penalty: row.penalty,
            is_processed: row.is_processed,
            processed_at: row.processed_at,
        })
    }
}

/// Outcome of a verdict, written in one transaction
#[derive(Debug, Clone, PartialEq)]
pub struct VerdictUpdate {
    pub contest_submission_id: Uuid,
    pub contest_id: Uuid,
    pub verdict: VerdictTag,
    pub is_accepted: bool,
    pub points: i64,
    pub penalty: i64,
    pub processed_at: DateTime<Utc>,
}

/// Result of a conditional verdict write
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    Applied(ContestSubmission),
    /// Another writer got there first
    AlreadyProcessed,
}

/// Candidate for the first accepted solve of a problem
#[derive(Debug, Clone, PartialEq)]
pub struct FirstBloodClaim {
    pub contest_id: Uuid,
    pub problem_id: Uuid,
    pub problem_label: String,
    pub user_id: Uuid,
    pub submission_id: Uuid,
    pub submission_time: i64,
}
