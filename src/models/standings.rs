//! Standings projection models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Contest, ScoringSystem};

/// Display status of one problem for one user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProblemStatus {
    #[serde(rename = "Not Attempted")]
    NotAttempted,
    #[serde(rename = "WA")]
    Wa,
    #[serde(rename = "AC")]
    Ac,
    /// Solved inside the freeze window, hidden from public views
    #[serde(rename = "Frozen")]
    Frozen,
}

/// Per-problem cell of a ranking entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemResult {
    pub problem_id: Uuid,
    pub label: String,
    pub status: ProblemStatus,
    /// Submissions up to and including the first accepted one
    pub attempts: i32,
    pub score: i64,
    pub penalty: i64,
    pub solved_at: Option<DateTime<Utc>>,
    /// Minutes from contest start of the first accepted submission
    pub submission_time: Option<i64>,
}

impl ProblemResult {
    pub fn not_attempted(problem_id: Uuid, label: impl Into<String>) -> Self {
        Self {
            problem_id,
            label: label.into(),
            status: ProblemStatus::NotAttempted,
            attempts: 0,
            score: 0,
            penalty: 0,
            solved_at: None,
            submission_time: None,
        }
    }

    pub fn is_solved(&self) -> bool {
        self.status == ProblemStatus::Ac
    }
}

/// One row of the leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub user_id: Uuid,
    pub rank: u32,
    pub total_score: i64,
    pub total_penalty: i64,
    pub total_submissions: u32,
    pub solved_count: u32,
    /// Latest submission time in minutes, last-resort tie-break
    pub last_submission_time: i64,
    pub problems: Vec<ProblemResult>,
}

impl RankingEntry {
    /// Recompute totals from the per-problem cells
    pub fn recompute_totals(&mut self) {
        self.total_score = self.problems.iter().map(|p| p.score).sum();
        self.total_penalty = self.problems.iter().map(|p| p.penalty).sum();
        self.solved_count = self.problems.iter().filter(|p| p.is_solved()).count() as u32;
    }
}

/// Full ranking of a contest at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingsSnapshot {
    pub contest_id: Uuid,
    pub scoring_system: ScoringSystem,
    pub rankings: Vec<RankingEntry>,
    pub last_updated: DateTime<Utc>,
    pub is_frozen: bool,
    /// Processed contest submissions the rankings were built from
    #[serde(default)]
    pub processed_submissions: i64,
}

impl StandingsSnapshot {
    /// Whether every verdict applied to `contest` is already reflected.
    ///
    /// The contest counter is bumped in the same transaction that marks a
    /// submission processed, so a lower count means the snapshot is stale.
    pub fn is_current_for(&self, contest: &Contest) -> bool {
        self.processed_submissions >= contest.total_submissions
    }
}

/// Pagination block of a standings page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u32,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let pages = total.div_ceil(limit.max(1) as u64) as u32;
        Self {
            page,
            limit,
            total,
            pages,
        }
    }

    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.limit as usize
    }
}

/// One page of standings as served to readers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingsPage {
    pub contest_id: Uuid,
    pub rankings: Vec<RankingEntry>,
    pub pagination: Pagination,
    pub last_updated: DateTime<Utc>,
    pub is_frozen: bool,
}

impl StandingsPage {
    /// Slice a snapshot into the requested page
    pub fn from_snapshot(snapshot: &StandingsSnapshot, page: u32, limit: u32) -> Self {
        let pagination = Pagination::new(page, limit, snapshot.rankings.len() as u64);
        let rankings = snapshot
            .rankings
            .iter()
            .skip(pagination.offset())
            .take(limit as usize)
            .cloned()
            .collect();

        Self {
            contest_id: snapshot.contest_id,
            rankings,
            pagination,
            last_updated: snapshot.last_updated,
            is_frozen: snapshot.is_frozen,
        }
    }
}
