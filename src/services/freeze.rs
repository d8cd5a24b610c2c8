//! Freeze-window projection of a standings snapshot

use chrono::{DateTime, Utc};

use super::ranking::rank_entries;
use crate::models::{ProblemStatus, StandingsSnapshot};

/// Hide accepted solves made at or after `freeze_start`.
///
/// Hidden cells keep their attempt count but lose score, penalty and solve
/// time. Totals and ranks are recomputed over what stays visible.
pub fn project_frozen(
    snapshot: &StandingsSnapshot,
    freeze_start: DateTime<Utc>,
) -> StandingsSnapshot {
    let mut projected = snapshot.clone();

    for entry in &mut projected.rankings {
        for cell in &mut entry.problems {
            let hidden = cell.status == ProblemStatus::Ac
                && cell.solved_at.is_some_and(|solved_at| solved_at >= freeze_start);
            if hidden {
                cell.status = ProblemStatus::Frozen;
                cell.score = 0;
                cell.penalty = 0;
                cell.solved_at = None;
                cell.submission_time = None;
            }
        }
        entry.recompute_totals();
    }

    rank_entries(projected.scoring_system, &mut projected.rankings);
    projected.is_frozen = true;
    projected
}
