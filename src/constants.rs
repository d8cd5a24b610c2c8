//! Application-wide constants
//!
//! This module contains all constant values used throughout the application.
//! Constants are grouped by their purpose for better organization.

// =============================================================================
// SERVER DEFAULTS
// =============================================================================

/// Default server host address
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port
pub const DEFAULT_SERVER_PORT: u16 = 8080;

// =============================================================================
// DATABASE DEFAULTS
// =============================================================================

/// Default maximum database connections in the pool
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 20;

// =============================================================================
// INGESTION DEFAULTS
// =============================================================================

/// Lease of the per-submission processing lock, in seconds
pub const DEFAULT_LOCK_TTL_SECS: u64 = 30;

/// Verdicts arriving later than contest end plus this grace are dropped
pub const DEFAULT_LATE_VERDICT_GRACE_MINUTES: i64 = 5;

// =============================================================================
// CACHE DEFAULTS
// =============================================================================

/// TTL of a cached standings page, in seconds
pub const DEFAULT_PAGE_CACHE_TTL_SECS: u64 = 60;

/// TTL of a cached full ranking, in seconds
pub const DEFAULT_RANKING_CACHE_TTL_SECS: u64 = 300;

/// Delay before a scheduled recompute runs, to coalesce bursts
pub const DEFAULT_DEBOUNCE_WINDOW_MS: u64 = 250;

/// Number of ranking entries pushed with every standings update
pub const DEFAULT_BROADCAST_TOP_N: usize = 50;

// =============================================================================
// DEAD LETTER DEFAULTS
// =============================================================================

/// Interval between dead-letter replay sweeps, in seconds
pub const DEFAULT_REPLAY_INTERVAL_SECS: u64 = 60;

/// Replay attempts before a record is moved to the exhausted list
pub const DEFAULT_REPLAY_MAX_ATTEMPTS: u32 = 5;

/// Base delay of the replay backoff, in milliseconds
pub const DEFAULT_REPLAY_BACKOFF_BASE_MS: u64 = 1_000;

/// Upper bound of the replay backoff, in milliseconds
pub const DEFAULT_REPLAY_BACKOFF_MAX_MS: u64 = 60_000;

/// Number of past days (including today) swept for dead letters
pub const DEFAULT_REPLAY_LOOKBACK_DAYS: u32 = 2;

// =============================================================================
// CONTEST SETTINGS
// =============================================================================

/// Contest scoring systems
pub mod scoring_systems {
    pub const ICPC: &str = "ICPC";
    pub const IOI: &str = "IOI";
    pub const ATCODER: &str = "AtCoder";
}

/// Penalty time for a wrong submission in AtCoder mode (in minutes)
pub const ATCODER_PENALTY_MINUTES: i64 = 5;

/// Default points of a contest problem
pub const DEFAULT_PROBLEM_POINTS: i64 = 100;

// =============================================================================
// REDIS KEYS
// =============================================================================

/// Redis key layout
pub mod keys {
    use uuid::Uuid;

    /// Lock held while a verdict for one submission is being applied
    pub fn judge_result_lock(submission_id: &Uuid) -> String {
        format!("lock:judge_result:{}", submission_id)
    }

    /// Prefix shared by every standings cache entry of a contest
    pub fn standings_prefix(contest_id: &Uuid) -> String {
        format!("standings:{}:", contest_id)
    }

    /// Memoized full ranking of a contest
    pub fn standings_full(contest_id: &Uuid) -> String {
        format!("standings:{}:full", contest_id)
    }

    /// One cached page of a contest's standings
    pub fn standings_page(contest_id: &Uuid, page: u32, limit: u32, is_frozen: bool) -> String {
        format!(
            "standings:{}:page:{}:{}:{}",
            contest_id,
            page,
            limit,
            if is_frozen { "frozen" } else { "live" }
        )
    }

    /// Dead-letter list for one day (`YYYY-MM-DD`)
    pub fn dead_letter_day(day: &str) -> String {
        format!("dead_letter:judge_results:{}", day)
    }

    /// Records that exhausted their replay attempts
    pub const DEAD_LETTER_EXHAUSTED: &str = "dead_letter:judge_results:exhausted";
}

// =============================================================================
// REAL-TIME ROOMS
// =============================================================================

/// Capacity of every room's broadcast channel
pub const ROOM_CHANNEL_CAPACITY: usize = 256;

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for standings
pub const DEFAULT_STANDINGS_PAGE_SIZE: u32 = 50;

/// Maximum page size for standings
pub const MAX_STANDINGS_PAGE_SIZE: u32 = 100;

// =============================================================================
// API VERSIONING
// =============================================================================

/// API base path
pub const API_BASE_PATH: &str = "/api/v1";
