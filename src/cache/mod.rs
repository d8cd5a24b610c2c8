//! Redis-backed coordination: processing locks, standings cache and the
//! dead-letter lists.
//!
//! Each concern sits behind a small trait so services can run against
//! in-memory fakes in tests.

pub mod dead_letter;
pub mod lock;
pub mod store;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

use crate::{error::AppResult, models::DeadLetterRecord};

pub use dead_letter::RedisDeadLetterQueue;
pub use lock::RedisLockProvider;
pub use store::RedisCache;

/// Short-lived mutual exclusion keyed by string
#[async_trait]
pub trait LockProvider: Send + Sync {
    /// Take the lock for `ttl` if nobody holds it
    async fn try_acquire(&self, key: &str, token: &str, ttl: Duration) -> AppResult<bool>;

    /// Release the lock only if it is still held with `token`
    async fn release(&self, key: &str, token: &str) -> AppResult<bool>;
}

/// String cache with per-entry expiry
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()>;

    /// Drop every entry whose key starts with `prefix`, returning how many went
    async fn delete_prefix(&self, prefix: &str) -> AppResult<u64>;
}

/// Day-bucketed lists of verdicts that failed to apply
#[async_trait]
pub trait DeadLetterStore: Send + Sync {
    /// Append to the bucket of the record's day
    async fn push(&self, record: &DeadLetterRecord) -> AppResult<()>;

    /// Remove and return the oldest record of a day
    async fn pop(&self, day: &str) -> AppResult<Option<DeadLetterRecord>>;

    async fn list(&self, day: &str) -> AppResult<Vec<DeadLetterRecord>>;

    /// Park a record that ran out of replay attempts
    async fn push_exhausted(&self, record: &DeadLetterRecord) -> AppResult<()>;

    async fn list_exhausted(&self) -> AppResult<Vec<DeadLetterRecord>>;
}

/// Read and decode a JSON cache entry
pub async fn get_json<T: DeserializeOwned>(
    cache: &dyn CacheStore,
    key: &str,
) -> AppResult<Option<T>> {
    match cache.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Encode and store a JSON cache entry
pub async fn set_json<T: Serialize + Sync>(
    cache: &dyn CacheStore,
    key: &str,
    value: &T,
    ttl: Duration,
) -> AppResult<()> {
    let raw = serde_json::to_string(value)?;
    cache.set(key, &raw, ttl).await
}
