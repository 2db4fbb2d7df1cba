pub mod memory;
pub mod redis;
pub mod timerange;

pub use memory::MemoryKv;
pub use redis::RedisKv;
pub use timerange::{DirectoryCache, TimeRangeCache};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(String),
}

impl From<::redis::RedisError> for CacheError {
    fn from(err: ::redis::RedisError) -> Self {
        CacheError::Backend(err.to_string())
    }
}

/// Key/value capability shared by the time-range cache and the socket token
/// store. Two interchangeable implementations exist (Redis and in-process);
/// nothing above this trait branches on which one is active.
#[async_trait]
pub trait KvBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Atomic lookup-and-delete, the single-use primitive for tokens.
    async fn get_del(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn del(&self, keys: &[String]) -> Result<(), CacheError>;

    async fn sadd(&self, set: &str, member: &str) -> Result<(), CacheError>;

    async fn smembers(&self, set: &str) -> Result<Vec<String>, CacheError>;
}
