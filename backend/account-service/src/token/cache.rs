use crate::error::Result;
use crate::token::TokenClass;
use async_trait::async_trait;
use chrono::Duration;
use redis_utils::SharedConnectionManager;
use uuid::Uuid;

/// Keyed store for the currently-live token of each `(class, subject)`.
///
/// The cache is the revocation oracle: a structurally valid token whose entry
/// is missing (expired, already confirmed, or explicitly deleted) is treated
/// as revoked. `put` overwrites unconditionally, which is what guarantees at
/// most one live token per key.
#[async_trait]
pub trait TokenCache: Send + Sync {
    async fn get(&self, class: TokenClass, subject: Uuid) -> Result<Option<String>>;

    async fn put(
        &self,
        class: TokenClass,
        subject: Uuid,
        token: &str,
        ttl: Duration,
    ) -> Result<()>;

    /// Idempotent; deleting an absent key is not an error.
    async fn delete(&self, class: TokenClass, subject: Uuid) -> Result<()>;
}

/// Redis-backed token cache.
///
/// Every operation is a network round-trip; failures propagate to the caller
/// instead of being swallowed.
#[derive(Clone)]
pub struct RedisTokenCache {
    redis: SharedConnectionManager,
}

impl RedisTokenCache {
    pub fn new(redis: SharedConnectionManager) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl TokenCache for RedisTokenCache {
    async fn get(&self, class: TokenClass, subject: Uuid) -> Result<Option<String>> {
        let key = class.cache_key(subject);
        let mut conn = self.redis.lock().await.clone();

        let token: Option<String> = redis::cmd("GET").arg(&key).query_async(&mut conn).await?;

        Ok(token)
    }

    async fn put(
        &self,
        class: TokenClass,
        subject: Uuid,
        token: &str,
        ttl: Duration,
    ) -> Result<()> {
        let key = class.cache_key(subject);
        let mut conn = self.redis.lock().await.clone();

        redis::cmd("SETEX")
            .arg(&key)
            .arg(ttl.num_seconds())
            .arg(token)
            .query_async::<_, ()>(&mut conn)
            .await?;

        Ok(())
    }

    async fn delete(&self, class: TokenClass, subject: Uuid) -> Result<()> {
        let key = class.cache_key(subject);
        let mut conn = self.redis.lock().await.clone();

        redis::cmd("DEL")
            .arg(&key)
            .query_async::<_, ()>(&mut conn)
            .await?;

        Ok(())
    }
}
