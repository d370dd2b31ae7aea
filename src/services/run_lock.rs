use chrono::NaiveDate;
use redis::aio::ConnectionManager;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur with run lock operations
#[derive(Debug, Error)]
pub enum RunLockError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("A batch run for {0} is already in progress")]
    AlreadyHeld(NaiveDate),
}

// Delete the key only while it still holds our token
const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

/// Redis-backed mutual exclusion for batch runs of the same date
///
/// The lock expires after `ttl`, so a crashed run never blocks the next one
/// for longer than that.
#[derive(Clone)]
pub struct RunLock {
    redis: ConnectionManager,
    ttl: Duration,
}

/// Proof of a held lock; pass back to `release`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLockGuard {
    pub key: String,
    pub token: String,
    pub run_date: NaiveDate,
}

impl RunLock {
    pub async fn new(redis_url: &str, ttl: Duration) -> Result<Self, RunLockError> {
        let client = redis::Client::open(redis_url)?;
        let redis = ConnectionManager::new(client).await?;
        Ok(Self { redis, ttl })
    }

    /// Build the lock key for a run date
    pub fn key(run_date: NaiveDate) -> String {
        format!("rentmatch:daily_matches:{}", run_date.format("%Y-%m-%d"))
    }

    /// Take the lock for `run_date` or fail with `AlreadyHeld`
    pub async fn try_acquire(&self, run_date: NaiveDate) -> Result<RunLockGuard, RunLockError> {
        let key = Self::key(run_date);
        let token = uuid::Uuid::new_v4().to_string();
        let ttl_ms = u64::try_from(self.ttl.as_millis()).unwrap_or(u64::MAX);

        let mut conn = self.redis.clone();
        let acquired: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(&token)
            .arg("NX")
            .arg("PX")
            .arg(ttl_ms)
            .query_async(&mut conn)
            .await?;

        if acquired.is_none() {
            tracing::warn!("Run lock for {} is held by another run", run_date);
            return Err(RunLockError::AlreadyHeld(run_date));
        }

        tracing::debug!("Acquired run lock {}", key);
        Ok(RunLockGuard {
            key,
            token,
            run_date,
        })
    }

    /// Release a held lock; returns false if it had already expired or been taken over
    pub async fn release(&self, guard: RunLockGuard) -> Result<bool, RunLockError> {
        let mut conn = self.redis.clone();
        let deleted: i64 = redis::Script::new(RELEASE_SCRIPT)
            .key(&guard.key)
            .arg(&guard.token)
            .invoke_async(&mut conn)
            .await?;

        if deleted == 0 {
            tracing::warn!("Run lock {} expired before release", guard.key);
        }
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_key_builder() {
        let date = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();
        assert_eq!(RunLock::key(date), "rentmatch:daily_matches:2024-08-01");
    }

    #[tokio::test]
    #[ignore = "Requires Redis"]
    async fn test_lock_is_exclusive() {
        let lock = RunLock::new("redis://127.0.0.1:6379", Duration::from_secs(30))
            .await
            .expect("Failed to connect to Redis");
        let date = NaiveDate::from_ymd_opt(2024, 8, 2).unwrap();

        let guard = lock.try_acquire(date).await.unwrap();
        assert!(matches!(
            lock.try_acquire(date).await,
            Err(RunLockError::AlreadyHeld(_))
        ));
        assert!(lock.release(guard).await.unwrap());
        let again = lock.try_acquire(date).await.unwrap();
        assert!(lock.release(again).await.unwrap());
    }
}
