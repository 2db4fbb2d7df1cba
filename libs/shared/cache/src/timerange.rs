use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::KvBackend;

const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Windowed result cache keyed by (subject, window start, window end).
/// Every live key is registered in a per-subject set so one mutation can
/// drop all of a subject's windows without scanning the keyspace. Backend
/// failures degrade to a miss or a no-op, never a request error.
pub struct TimeRangeCache {
    backend: Arc<dyn KvBackend>,
    ttl: Duration,
}

impl TimeRangeCache {
    pub fn new(backend: Arc<dyn KvBackend>) -> Self {
        Self {
            backend,
            ttl: DEFAULT_TTL,
        }
    }

    pub fn with_ttl(backend: Arc<dyn KvBackend>, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    fn entry_key(subject: Uuid, window_start: &str, window_end: &str) -> String {
        format!("events:doctor:{subject}:{window_start}:{window_end}")
    }

    fn index_key(subject: Uuid) -> String {
        format!("events:keys:doctor:{subject}")
    }

    pub async fn get<T>(&self, subject: Uuid, window_start: &str, window_end: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let key = Self::entry_key(subject, window_start, window_end);
        match self.backend.get(&key).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).ok(),
            Ok(None) => None,
            Err(e) => {
                debug!("Cache read failed for {key}: {e}");
                None
            }
        }
    }

    pub async fn put<T>(&self, subject: Uuid, window_start: &str, window_end: &str, payload: &T)
    where
        T: Serialize,
    {
        let Ok(raw) = serde_json::to_string(payload) else {
            return;
        };
        let key = Self::entry_key(subject, window_start, window_end);
        if let Err(e) = self.backend.set_ex(&key, &raw, self.ttl).await {
            debug!("Cache write failed for {key}: {e}");
            return;
        }
        if let Err(e) = self.backend.sadd(&Self::index_key(subject), &key).await {
            debug!("Cache index update failed for {key}: {e}");
        }
    }

    /// Drops every cached window for the subject, then the index itself.
    pub async fn invalidate(&self, subject: Uuid) {
        let index = Self::index_key(subject);
        let keys = match self.backend.smembers(&index).await {
            Ok(keys) => keys,
            Err(e) => {
                debug!("Cache invalidation skipped for {subject}: {e}");
                return;
            }
        };
        if !keys.is_empty() {
            if let Err(e) = self.backend.del(&keys).await {
                debug!("Cache invalidation failed for {subject}: {e}");
                return;
            }
        }
        if let Err(e) = self.backend.del(std::slice::from_ref(&index)).await {
            debug!("Cache index delete failed for {subject}: {e}");
        }
    }
}

/// Single-key cache for the global patient directory listing.
pub struct DirectoryCache {
    backend: Arc<dyn KvBackend>,
    ttl: Duration,
}

impl DirectoryCache {
    const KEY: &'static str = "patients:list";

    pub fn new(backend: Arc<dyn KvBackend>) -> Self {
        Self {
            backend,
            ttl: DEFAULT_TTL,
        }
    }

    pub async fn get<T>(&self) -> Option<T>
    where
        T: DeserializeOwned,
    {
        match self.backend.get(Self::KEY).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).ok(),
            Ok(None) => None,
            Err(e) => {
                debug!("Directory cache read failed: {e}");
                None
            }
        }
    }

    pub async fn put<T>(&self, payload: &T)
    where
        T: Serialize,
    {
        let Ok(raw) = serde_json::to_string(payload) else {
            return;
        };
        if let Err(e) = self.backend.set_ex(Self::KEY, &raw, self.ttl).await {
            debug!("Directory cache write failed: {e}");
        }
    }

    pub async fn invalidate(&self) {
        if let Err(e) = self.backend.del(&[Self::KEY.to_string()]).await {
            debug!("Directory cache delete failed: {e}");
        }
    }
}
