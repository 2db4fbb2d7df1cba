use async_trait::async_trait;
use deadpool_redis::{Config, Connection, Pool, Runtime};
use redis::AsyncCommands;
use std::time::Duration;
use tracing::info;

use crate::{CacheError, KvBackend};

/// Redis-backed key/value store, shared across processes.
pub struct RedisKv {
    pool: Pool,
}

impl RedisKv {
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let cfg = Config::from_url(redis_url);
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| CacheError::Backend(format!("Failed to create Redis pool: {e}")))?;

        // Verify the connection up front so a bad URL fails at startup.
        let mut conn = pool
            .get()
            .await
            .map_err(|e| CacheError::Backend(format!("Failed to connect to Redis: {e}")))?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        info!("Redis connected");

        Ok(Self { pool })
    }

    async fn connection(&self) -> Result<Connection, CacheError> {
        self.pool
            .get()
            .await
            .map_err(|e| CacheError::Backend(format!("Failed to get Redis connection: {e}")))
    }
}

#[async_trait]
impl KvBackend for RedisKv {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection().await?;
        Ok(conn.get(key).await?)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let _: () = conn.set_ex(key, value, ttl.as_secs().max(1)).await?;
        Ok(())
    }

    async fn get_del(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = redis::cmd("GETDEL").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn del(&self, keys: &[String]) -> Result<(), CacheError> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection().await?;
        let _: () = conn.del(keys.to_vec()).await?;
        Ok(())
    }

    async fn sadd(&self, set: &str, member: &str) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let _: () = conn.sadd(set, member).await?;
        Ok(())
    }

    async fn smembers(&self, set: &str) -> Result<Vec<String>, CacheError> {
        let mut conn = self.connection().await?;
        Ok(conn.smembers(set).await?)
    }
}
