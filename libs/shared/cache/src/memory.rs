use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::{CacheError, KvBackend};

/// In-process fallback backend. Entries expire lazily against their deadline;
/// validity is process-local only.
#[derive(Default)]
pub struct MemoryKv {
    entries: RwLock<HashMap<String, (String, Option<Instant>)>>,
    sets: RwLock<HashMap<String, HashSet<String>>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_live(deadline: &Option<Instant>) -> bool {
        deadline.map(|d| Instant::now() < d).unwrap_or(true)
    }
}

#[async_trait]
impl KvBackend for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some((value, deadline)) if Self::is_live(deadline) => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            (value.to_string(), Some(Instant::now() + ttl)),
        );
        Ok(())
    }

    async fn get_del(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = self.entries.write().await;
        match entries.remove(key) {
            Some((value, deadline)) if Self::is_live(&deadline) => Ok(Some(value)),
            _ => Ok(None),
        }
    }

    async fn del(&self, keys: &[String]) -> Result<(), CacheError> {
        let mut entries = self.entries.write().await;
        let mut sets = self.sets.write().await;
        for key in keys {
            entries.remove(key);
            sets.remove(key);
        }
        Ok(())
    }

    async fn sadd(&self, set: &str, member: &str) -> Result<(), CacheError> {
        let mut sets = self.sets.write().await;
        sets.entry(set.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn smembers(&self, set: &str) -> Result<Vec<String>, CacheError> {
        let sets = self.sets.read().await;
        Ok(sets
            .get(set)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default())
    }
}
