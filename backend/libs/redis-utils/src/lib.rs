use anyhow::{Context, Result};
use redis::aio::ConnectionManager;
use redis::Client;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Shared Redis connection manager guarded by a Tokio mutex.
///
/// The manager reconnects transparently after transient failures; callers
/// clone the inner handle per operation instead of holding the lock across
/// awaits.
pub type SharedConnectionManager = Arc<Mutex<ConnectionManager>>;

/// Redis connection pool shared across service components.
pub struct RedisPool {
    manager: SharedConnectionManager,
}

impl RedisPool {
    /// Connect to Redis and initialize the connection manager.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client =
            Client::open(redis_url).context("failed to parse REDIS_URL connection string")?;
        let connection_manager = ConnectionManager::new(client)
            .await
            .context("failed to initialize Redis connection manager")?;

        info!("Redis connection manager initialized");

        Ok(Self {
            manager: Arc::new(Mutex::new(connection_manager)),
        })
    }

    /// Handle to the shared connection manager.
    pub fn manager(&self) -> SharedConnectionManager {
        self.manager.clone()
    }

    /// Round-trip a PING to verify the connection is alive.
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.manager.lock().await.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .context("Redis PING failed")?;
        Ok(())
    }
}
