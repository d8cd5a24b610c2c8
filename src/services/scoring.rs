//! Per-problem score and penalty of an accepted submission

use crate::{constants::ATCODER_PENALTY_MINUTES, models::ScoringSystem};

/// Score and penalty credited for one solved problem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProblemScore {
    pub score: i64,
    pub penalty: i64,
}

/// Score the first accepted submission of a (user, problem).
///
/// `attempts` counts the accepted attempt itself, `submission_time` is in
/// minutes from contest start.
pub fn score(
    system: ScoringSystem,
    attempts: i32,
    submission_time: i64,
    penalty_per_wrong: i64,
    max_points: i64,
) -> ProblemScore {
    let wrong = i64::from(attempts.max(1) - 1);

    match system {
        ScoringSystem::Icpc => ProblemScore {
            score: 1,
            penalty: submission_time + wrong * penalty_per_wrong,
        },
        ScoringSystem::Ioi => ProblemScore {
            score: max_points,
            penalty: 0,
        },
        ScoringSystem::AtCoder => ProblemScore {
            score: max_points,
            penalty: submission_time + wrong * ATCODER_PENALTY_MINUTES,
        },
    }
}
