//! Thread-correlation store — Redis-backed mapping from correlation key
//! to Slack thread handle.
//!
//! A handle is only ever read after a prior ban/partial-block notify
//! wrote it; a miss simply means the next event starts a new top-level
//! thread. Every record carries a TTL: 30 minutes for partial blocks
//! (the bounded flowspec window) and a long 30-day default for bans, so
//! the store stays self-cleaning without an external flush.
//!
//! No get-then-set transactionality: the consumer processes events
//! strictly one at a time, so same-key races cannot occur.

use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use fnm_common::types::CorrelationKey;

const KEY_PREFIX: &str = "thread:";

/// Redis-backed correlation-key → thread-handle store.
#[derive(Clone)]
pub struct ThreadStore {
    redis: ConnectionManager,
    default_ttl_secs: u64,
}

impl ThreadStore {
    pub fn new(redis: ConnectionManager, default_ttl_secs: u64) -> Self {
        Self {
            redis,
            default_ttl_secs,
        }
    }

    fn redis_key(key: &CorrelationKey) -> String {
        format!("{KEY_PREFIX}{key}")
    }

    /// Look up the thread handle for a key, if one is live.
    pub async fn get(&mut self, key: &CorrelationKey) -> anyhow::Result<Option<String>> {
        let handle: Option<String> = self.redis.get(Self::redis_key(key)).await?;
        Ok(handle)
    }

    /// Persist a handle under the default (ban) retention window.
    pub async fn set(&mut self, key: &CorrelationKey, handle: &str) -> anyhow::Result<()> {
        self.set_with_ttl(key, handle, self.default_ttl_secs).await
    }

    /// Persist a handle with an explicit TTL in seconds.
    pub async fn set_with_ttl(
        &mut self,
        key: &CorrelationKey,
        handle: &str,
        ttl_secs: u64,
    ) -> anyhow::Result<()> {
        self.redis
            .set_ex::<_, _, ()>(Self::redis_key(key), handle, ttl_secs)
            .await?;
        Ok(())
    }
}
