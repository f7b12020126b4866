use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::CrmlinkError;

use super::KeyValueStore;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Utc::now() >= exp)
    }
}

/// Process-local store. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        entries.values().filter(|e| !e.is_expired()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

pub(crate) fn expiry_from_ttl(ttl: Option<Duration>) -> Result<Option<DateTime<Utc>>, CrmlinkError> {
    ttl.map(|ttl| {
        chrono::Duration::from_std(ttl)
            .map(|d| Utc::now() + d)
            .map_err(|e| CrmlinkError::Store(format!("TTL out of range: {e}")))
    })
    .transpose()
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), CrmlinkError> {
        let entry = Entry {
            value: value.to_string(),
            expires_at: expiry_from_ttl(ttl)?,
        };
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CrmlinkError> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }
        // Expired: evict under the write lock.
        self.entries.write().await.remove(key);
        Ok(None)
    }
}
