//! Redis dead-letter lists

use async_trait::async_trait;
use redis::aio::ConnectionManager;

use super::DeadLetterStore;
use crate::{constants::keys, error::AppResult, models::DeadLetterRecord};

/// Day lists expire after two weeks
const DAY_RETENTION_SECS: u64 = 14 * 24 * 60 * 60;

/// One Redis list per day plus a list of exhausted records
#[derive(Clone)]
pub struct RedisDeadLetterQueue {
    conn: ConnectionManager,
}

impl RedisDeadLetterQueue {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    async fn range(&self, key: &str) -> AppResult<Vec<DeadLetterRecord>> {
        let mut conn = self.conn.clone();
        let raw: Vec<String> = redis::cmd("LRANGE")
            .arg(key)
            .arg(0)
            .arg(-1)
            .query_async(&mut conn)
            .await?;

        let mut records = Vec::with_capacity(raw.len());
        for entry in raw {
            match serde_json::from_str(&entry) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(
                        key = %key,
                        error = %e,
                        "Skipping malformed dead-letter entry"
                    );
                }
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl DeadLetterStore for RedisDeadLetterQueue {
    async fn push(&self, record: &DeadLetterRecord) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let key = keys::dead_letter_day(&record.day());
        let payload = serde_json::to_string(record)?;

        let _: () = redis::pipe()
            .cmd("RPUSH")
            .arg(&key)
            .arg(payload)
            .ignore()
            .cmd("EXPIRE")
            .arg(&key)
            .arg(DAY_RETENTION_SECS)
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(())
    }

    async fn pop(&self, day: &str) -> AppResult<Option<DeadLetterRecord>> {
        let mut conn = self.conn.clone();
        let key = keys::dead_letter_day(day);

        loop {
            let raw: Option<String> = redis::cmd("LPOP").arg(&key).query_async(&mut conn).await?;
            let Some(entry) = raw else {
                return Ok(None);
            };

            match serde_json::from_str(&entry) {
                Ok(record) => return Ok(Some(record)),
                Err(e) => {
                    tracing::error!(
                        key = %key,
                        payload = %entry,
                        error = %e,
                        "Dropping malformed dead-letter entry"
                    );
                }
            }
        }
    }

    async fn list(&self, day: &str) -> AppResult<Vec<DeadLetterRecord>> {
        self.range(&keys::dead_letter_day(day)).await
    }

    async fn push_exhausted(&self, record: &DeadLetterRecord) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let payload = serde_json::to_string(record)?;
        let _: () = redis::cmd("RPUSH")
            .arg(keys::DEAD_LETTER_EXHAUSTED)
            .arg(payload)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn list_exhausted(&self) -> AppResult<Vec<DeadLetterRecord>> {
        self.range(keys::DEAD_LETTER_EXHAUSTED).await
    }
}
