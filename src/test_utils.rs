//! In-memory fakes of every storage seam plus contest fixtures

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use uuid::Uuid;

use crate::{
    cache::{CacheStore, DeadLetterStore, LockProvider},
    config::{DeadLetterConfig, StandingsConfig},
    db::ContestStore,
    error::{AppError, AppResult},
    models::{
        ApplyOutcome, Contest, ContestProblem, ContestSubmission, DeadLetterRecord,
        FirstBloodClaim, RealtimeEvent, Room, ScoringSystem, StandingsSnapshot, VerdictTag,
        VerdictUpdate,
    },
    realtime::Publisher,
    services::{Engine, EngineDeps},
};

// =============================================================================
// CONTEST STORE
// =============================================================================

#[derive(Default)]
pub struct MemoryContestStore {
    contests: Mutex<HashMap<Uuid, Contest>>,
    submissions: Mutex<HashMap<Uuid, ContestSubmission>>,
    first_bloods: Mutex<HashMap<(Uuid, Uuid), i64>>,
    snapshots: Mutex<HashMap<Uuid, StandingsSnapshot>>,
    /// Make every `apply_verdict` fail as if the transaction aborted
    pub fail_apply: AtomicBool,
    mutations: AtomicUsize,
    list_calls: AtomicUsize,
}

impl MemoryContestStore {
    pub fn insert_contest(&self, contest: Contest) {
        self.contests.lock().unwrap().insert(contest.id, contest);
    }

    pub fn insert_submission(&self, submission: ContestSubmission) {
        self.submissions
            .lock()
            .unwrap()
            .insert(submission.id, submission);
    }

    pub fn submission(&self, submission_id: &Uuid) -> Option<ContestSubmission> {
        self.submissions
            .lock()
            .unwrap()
            .values()
            .find(|s| s.submission_id == *submission_id)
            .cloned()
    }

    /// Stored contest with counters matching its processed submissions, as
    /// the verdict transaction keeps them in Postgres
    pub fn contest(&self, contest_id: &Uuid) -> Option<Contest> {
        let mut contest = self.contests.lock().unwrap().get(contest_id).cloned()?;
        let submissions = self.submissions.lock().unwrap();
        let processed = submissions
            .values()
            .filter(|s| s.contest_id == *contest_id && s.is_processed);
        let (total, accepted) = processed.fold((0, 0), |(total, accepted), s| {
            (total + 1, accepted + i64::from(s.is_accepted))
        });
        contest.total_submissions = total;
        contest.accepted_submissions = accepted;
        Some(contest)
    }

    pub fn snapshot(&self, contest_id: &Uuid) -> Option<StandingsSnapshot> {
        self.snapshots.lock().unwrap().get(contest_id).cloned()
    }

    /// Verdicts actually written
    pub fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    /// Full scans of a contest's submissions, one per aggregation
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContestStore for MemoryContestStore {
    async fn find_contest(&self, contest_id: &Uuid) -> AppResult<Option<Contest>> {
        Ok(self.contest(contest_id))
    }

    async fn find_by_submission(
        &self,
        submission_id: &Uuid,
    ) -> AppResult<Option<ContestSubmission>> {
        Ok(self.submission(submission_id))
    }

    async fn has_earlier_accepted(&self, submission: &ContestSubmission) -> AppResult<bool> {
        let key = (submission.submission_time, submission.attempt_number);
        Ok(self.submissions.lock().unwrap().values().any(|s| {
            s.contest_id == submission.contest_id
                && s.user_id == submission.user_id
                && s.problem_id == submission.problem_id
                && s.id != submission.id
                && s.is_processed
                && s.is_accepted
                && (s.submission_time, s.attempt_number) < key
        }))
    }

    async fn apply_verdict(&self, update: &VerdictUpdate) -> AppResult<ApplyOutcome> {
        tokio::task::yield_now().await;

        if self.fail_apply.load(Ordering::SeqCst) {
            return Err(AppError::Database("deadlock detected".to_string()));
        }

        let applied = {
            let mut submissions = self.submissions.lock().unwrap();
            let Some(row) = submissions.get_mut(&update.contest_submission_id) else {
                return Err(AppError::NotFound("contest submission".to_string()));
            };
            if row.is_processed {
                return Ok(ApplyOutcome::AlreadyProcessed);
            }
            row.verdict = Some(update.verdict);
            row.is_accepted = update.is_accepted;
            row.points = update.points;
            row.penalty = update.penalty;
            row.is_processed = true;
            row.processed_at = Some(update.processed_at);
            row.clone()
        };

        self.mutations.fetch_add(1, Ordering::SeqCst);
        Ok(ApplyOutcome::Applied(applied))
    }

    async fn list_by_contest(&self, contest_id: &Uuid) -> AppResult<Vec<ContestSubmission>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .submissions
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.contest_id == *contest_id)
            .cloned()
            .collect())
    }

    async fn claim_first_blood(&self, claim: &FirstBloodClaim) -> AppResult<bool> {
        let mut claims = self.first_bloods.lock().unwrap();
        let key = (claim.contest_id, claim.problem_id);
        match claims.get(&key) {
            Some(existing) if *existing <= claim.submission_time => Ok(false),
            _ => {
                claims.insert(key, claim.submission_time);
                Ok(true)
            }
        }
    }

    async fn save_snapshot(&self, snapshot: &StandingsSnapshot) -> AppResult<()> {
        self.snapshots
            .lock()
            .unwrap()
            .insert(snapshot.contest_id, snapshot.clone());
        Ok(())
    }

    async fn load_snapshot(&self, contest_id: &Uuid) -> AppResult<Option<StandingsSnapshot>> {
        Ok(self.snapshot(contest_id))
    }
}

// =============================================================================
// LOCKS, CACHE, DEAD LETTERS
// =============================================================================

#[derive(Default)]
pub struct MemoryLockProvider {
    leases: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryLockProvider {
    pub fn is_held(&self, key: &str) -> bool {
        self.leases
            .lock()
            .unwrap()
            .get(key)
            .is_some_and(|(_, expires)| *expires > Instant::now())
    }
}

#[async_trait]
impl LockProvider for MemoryLockProvider {
    async fn try_acquire(&self, key: &str, token: &str, ttl: Duration) -> AppResult<bool> {
        let mut leases = self.leases.lock().unwrap();
        let now = Instant::now();
        if leases.get(key).is_some_and(|(_, expires)| *expires > now) {
            return Ok(false);
        }
        leases.insert(key.to_string(), (token.to_string(), now + ttl));
        Ok(true)
    }

    async fn release(&self, key: &str, token: &str) -> AppResult<bool> {
        let mut leases = self.leases.lock().unwrap();
        match leases.get(key) {
            Some((holder, _)) if holder == token => {
                leases.remove(key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Lock provider whose first `failures` acquisitions error out
pub struct FlakyLockProvider {
    inner: MemoryLockProvider,
    failures: AtomicUsize,
}

impl FlakyLockProvider {
    pub fn new(failures: usize) -> Self {
        Self {
            inner: MemoryLockProvider::default(),
            failures: AtomicUsize::new(failures),
        }
    }
}

#[async_trait]
impl LockProvider for FlakyLockProvider {
    async fn try_acquire(&self, key: &str, token: &str, ttl: Duration) -> AppResult<bool> {
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(AppError::Redis("connection reset by peer".to_string()));
        }
        self.inner.try_acquire(key, token, ttl).await
    }

    async fn release(&self, key: &str, token: &str) -> AppResult<bool> {
        self.inner.release(key, token).await
    }
}

#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryCache {
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, (_, expires))| *expires > now)
            .map(|(key, _)| key.clone())
            .collect()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .get(key)
            .filter(|(_, expires)| *expires > Instant::now())
            .map(|(value, _)| value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> AppResult<u64> {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok((before - entries.len()) as u64)
    }
}

/// Cache that is always unreachable
#[derive(Default)]
pub struct UnreachableCache;

#[async_trait]
impl CacheStore for UnreachableCache {
    async fn get(&self, _key: &str) -> AppResult<Option<String>> {
        Err(AppError::Redis("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> AppResult<()> {
        Err(AppError::Redis("connection refused".to_string()))
    }

    async fn delete_prefix(&self, _prefix: &str) -> AppResult<u64> {
        Err(AppError::Redis("connection refused".to_string()))
    }
}

#[derive(Default)]
pub struct MemoryDeadLetters {
    days: Mutex<HashMap<String, VecDeque<DeadLetterRecord>>>,
    exhausted: Mutex<Vec<DeadLetterRecord>>,
}

impl MemoryDeadLetters {
    pub fn len(&self, day: &str) -> usize {
        self.days.lock().unwrap().get(day).map_or(0, VecDeque::len)
    }

    pub fn exhausted(&self) -> Vec<DeadLetterRecord> {
        self.exhausted.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeadLetterStore for MemoryDeadLetters {
    async fn push(&self, record: &DeadLetterRecord) -> AppResult<()> {
        self.days
            .lock()
            .unwrap()
            .entry(record.day())
            .or_default()
            .push_back(record.clone());
        Ok(())
    }

    async fn pop(&self, day: &str) -> AppResult<Option<DeadLetterRecord>> {
        Ok(self
            .days
            .lock()
            .unwrap()
            .get_mut(day)
            .and_then(VecDeque::pop_front))
    }

    async fn list(&self, day: &str) -> AppResult<Vec<DeadLetterRecord>> {
        Ok(self
            .days
            .lock()
            .unwrap()
            .get(day)
            .map(|records| records.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn push_exhausted(&self, record: &DeadLetterRecord) -> AppResult<()> {
        self.exhausted.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn list_exhausted(&self) -> AppResult<Vec<DeadLetterRecord>> {
        Ok(self.exhausted())
    }
}

// =============================================================================
// PUBLISHER
// =============================================================================

/// Publisher that remembers everything it was asked to send
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<(Room, RealtimeEvent)>>,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<(Room, RealtimeEvent)> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, event)| event.kind() == kind)
            .count()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, room: Room, event: &RealtimeEvent) -> AppResult<()> {
        self.events.lock().unwrap().push((room, event.clone()));
        Ok(())
    }
}

// =============================================================================
// ENGINE HARNESS
// =============================================================================

/// Engine wired to in-memory fakes, with handles on every fake
pub struct TestEngine {
    pub engine: Engine,
    pub store: Arc<MemoryContestStore>,
    pub locks: Arc<MemoryLockProvider>,
    pub cache: Arc<MemoryCache>,
    pub dead_letters: Arc<MemoryDeadLetters>,
    pub publisher: Arc<RecordingPublisher>,
}

/// Seams to swap out when wiring a [`TestEngine`]
#[derive(Default)]
pub struct Overrides {
    pub publisher: Option<Arc<dyn Publisher>>,
    pub cache: Option<Arc<dyn CacheStore>>,
    pub locks: Option<Arc<dyn LockProvider>>,
    pub config: Option<StandingsConfig>,
}

impl TestEngine {
    pub fn new() -> Self {
        Self::with_overrides(Overrides::default())
    }

    pub fn with_config(config: StandingsConfig) -> Self {
        Self::with_overrides(Overrides {
            config: Some(config),
            ..Overrides::default()
        })
    }

    /// Wire a custom publisher; `publisher` is still exposed but stays empty
    pub fn with_publisher(publisher: Arc<dyn Publisher>) -> Self {
        Self::with_overrides(Overrides {
            publisher: Some(publisher),
            ..Overrides::default()
        })
    }

    /// Wire the given seams in place of the in-memory fakes. Replaced fakes
    /// are still exposed but see no traffic.
    pub fn with_overrides(overrides: Overrides) -> Self {
        let store = Arc::new(MemoryContestStore::default());
        let locks = Arc::new(MemoryLockProvider::default());
        let cache = Arc::new(MemoryCache::default());
        let dead_letters = Arc::new(MemoryDeadLetters::default());
        let recording = Arc::new(RecordingPublisher::default());

        let engine = Engine::new(
            EngineDeps {
                store: store.clone(),
                locks: overrides
                    .locks
                    .unwrap_or_else(|| locks.clone() as Arc<dyn LockProvider>),
                cache: overrides
                    .cache
                    .unwrap_or_else(|| cache.clone() as Arc<dyn CacheStore>),
                dead_letters: dead_letters.clone(),
                publisher: overrides
                    .publisher
                    .unwrap_or_else(|| recording.clone() as Arc<dyn Publisher>),
            },
            overrides.config.unwrap_or_else(test_standings_config),
            test_dead_letter_config(),
        );

        Self {
            engine,
            store,
            locks,
            cache,
            dead_letters,
            publisher: recording,
        }
    }

    /// Wait until no recompute is queued or running for `contest_id`
    pub async fn settle(&self, contest_id: Uuid) {
        for _ in 0..200 {
            if !self.engine.scheduler.is_running(&contest_id) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("recompute for {} did not settle", contest_id);
    }
}

pub fn test_standings_config() -> StandingsConfig {
    StandingsConfig {
        debounce_window: Duration::ZERO,
        ..StandingsConfig::default()
    }
}

pub fn test_dead_letter_config() -> DeadLetterConfig {
    DeadLetterConfig {
        backoff_base_ms: 0,
        backoff_max_ms: 0,
        ..DeadLetterConfig::default()
    }
}

// =============================================================================
// FIXTURES
// =============================================================================

/// Running contest: started 100 minutes ago, ends in 80, 60-minute freeze,
/// three participants and `problems` problems labelled from `A`
pub fn contest_fixture(system: ScoringSystem, problems: usize) -> Contest {
    let now = Utc::now();
    Contest {
        id: Uuid::new_v4(),
        title: "Weekly Round".to_string(),
        start_time: now - ChronoDuration::minutes(100),
        end_time: now + ChronoDuration::minutes(80),
        registration_deadline: None,
        scoring_system: system,
        problems: (0..problems)
            .map(|idx| ContestProblem {
                problem_id: Uuid::new_v4(),
                label: char::from(b'A' + idx as u8).to_string(),
                max_points: 100 * (idx as i64 + 1),
            })
            .collect(),
        penalty_per_wrong: 20,
        freeze_time_minutes: 60,
        is_published: true,
        is_visible: true,
        participants: (0..3).map(|_| Uuid::new_v4()).collect(),
        total_submissions: 0,
        accepted_submissions: 0,
    }
}

/// Unprocessed contest submission made `minute` minutes into the contest
pub fn pending(
    contest: &Contest,
    user_id: Uuid,
    problem_id: Uuid,
    attempt: i32,
    minute: i64,
) -> ContestSubmission {
    ContestSubmission {
        id: Uuid::new_v4(),
        contest_id: contest.id,
        user_id,
        problem_id,
        problem_label: contest
            .problem(&problem_id)
            .map(|p| p.label.clone())
            .unwrap_or_else(|| "A".to_string()),
        submission_id: Uuid::new_v4(),
        submission_time: minute,
        submitted_at: contest.start_time + ChronoDuration::minutes(minute),
        attempt_number: attempt,
        verdict: None,
        is_accepted: false,
        points: 0,
        penalty: 0,
        is_processed: false,
        processed_at: None,
    }
}

/// Processed accepted submission with the given stored penalty
pub fn accepted(
    contest: &Contest,
    user_id: Uuid,
    problem_id: Uuid,
    attempt: i32,
    minute: i64,
    penalty: i64,
) -> ContestSubmission {
    let points = match contest.scoring_system {
        ScoringSystem::Icpc => 1,
        _ => contest.problem(&problem_id).map_or(0, |p| p.max_points),
    };
    ContestSubmission {
        verdict: Some(VerdictTag::Ac),
        is_accepted: true,
        points,
        penalty,
        is_processed: true,
        processed_at: Some(Utc::now()),
        ..pending(contest, user_id, problem_id, attempt, minute)
    }
}

/// Processed rejected submission
pub fn rejected(
    contest: &Contest,
    user_id: Uuid,
    problem_id: Uuid,
    attempt: i32,
    minute: i64,
    verdict: VerdictTag,
) -> ContestSubmission {
    ContestSubmission {
        verdict: Some(verdict),
        is_processed: true,
        processed_at: Some(Utc::now()),
        ..pending(contest, user_id, problem_id, attempt, minute)
    }
}
