//! Standings aggregation and ranking
//!
//! Rankings are always rebuilt from scratch out of processed contest
//! submissions. Nothing here is patched incrementally.

use std::{cmp::Ordering, collections::HashMap};

use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        Contest, ContestSubmission, ProblemResult, ProblemStatus, RankingEntry, ScoringSystem,
    },
};

/// Build ranked entries for every participant and every submitter of `contest`
pub fn aggregate(
    contest: &Contest,
    submissions: &[ContestSubmission],
) -> AppResult<Vec<RankingEntry>> {
    contest.validate()?;

    let mut processed: Vec<&ContestSubmission> = submissions
        .iter()
        .filter(|s| s.is_processed && s.contest_id == contest.id)
        .collect();
    processed.sort_by_key(|s| s.order_key());

    let problem_index: HashMap<Uuid, usize> = contest
        .problems
        .iter()
        .enumerate()
        .map(|(idx, p)| (p.problem_id, idx))
        .collect();

    let mut order: Vec<Uuid> = Vec::new();
    let mut entries: HashMap<Uuid, RankingEntry> = HashMap::new();

    for user_id in &contest.participants {
        if !entries.contains_key(user_id) {
            entries.insert(*user_id, empty_entry(contest, *user_id));
            order.push(*user_id);
        }
    }

    for submission in processed {
        let Some(&idx) = problem_index.get(&submission.problem_id) else {
            tracing::warn!(
                contest_id = %contest.id,
                problem_id = %submission.problem_id,
                contest_submission_id = %submission.id,
                "Ignoring submission for a problem outside the contest"
            );
            continue;
        };

        let entry = entries.entry(submission.user_id).or_insert_with(|| {
            order.push(submission.user_id);
            empty_entry(contest, submission.user_id)
        });

        entry.total_submissions += 1;
        entry.last_submission_time = entry.last_submission_time.max(submission.submission_time);

        let cell = &mut entry.problems[idx];
        if cell.is_solved() {
            continue;
        }

        cell.attempts += 1;
        if submission.is_accepted {
            cell.status = ProblemStatus::Ac;
            cell.score = submission.points;
            cell.penalty = submission.penalty;
            cell.solved_at = Some(submission.submitted_at);
            cell.submission_time = Some(submission.submission_time);
        } else {
            cell.status = ProblemStatus::Wa;
        }
    }

    let mut ranked: Vec<RankingEntry> = order
        .into_iter()
        .filter_map(|user_id| entries.remove(&user_id))
        .map(|mut entry| {
            entry.recompute_totals();
            entry
        })
        .collect();

    rank_entries(contest.scoring_system, &mut ranked);
    Ok(ranked)
}

/// Sort entries by the system's rules and assign competition ranks
pub fn rank_entries(system: ScoringSystem, entries: &mut [RankingEntry]) {
    entries.sort_by(|a, b| compare(system, a, b));

    let mut previous: Option<(i64, i64)> = None;
    let mut current_rank = 0;
    for (position, entry) in entries.iter_mut().enumerate() {
        let key = rank_key(system, entry);
        if previous != Some(key) {
            current_rank = position as u32 + 1;
            previous = Some(key);
        }
        entry.rank = current_rank;
    }
}

/// Tuple that decides whether two entries share a rank
fn rank_key(system: ScoringSystem, entry: &RankingEntry) -> (i64, i64) {
    match system {
        ScoringSystem::Icpc => (i64::from(entry.solved_count), entry.total_penalty),
        ScoringSystem::Ioi | ScoringSystem::AtCoder => (entry.total_score, entry.total_penalty),
    }
}

fn compare(system: ScoringSystem, a: &RankingEntry, b: &RankingEntry) -> Ordering {
    let (a_primary, a_penalty) = rank_key(system, a);
    let (b_primary, b_penalty) = rank_key(system, b);

    b_primary
        .cmp(&a_primary)
        .then(a_penalty.cmp(&b_penalty))
        .then(a.last_submission_time.cmp(&b.last_submission_time))
        .then(a.user_id.cmp(&b.user_id))
}

fn empty_entry(contest: &Contest, user_id: Uuid) -> RankingEntry {
    RankingEntry {
        user_id,
        rank: 0,
        total_score: 0,
        total_penalty: 0,
        total_submissions: 0,
        solved_count: 0,
        last_submission_time: 0,
        problems: contest
            .problems
            .iter()
            .map(|p| ProblemResult::not_attempted(p.problem_id, p.label.clone()))
            .collect(),
    }
}
