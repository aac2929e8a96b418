use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::BaseCache;
use crate::config::Config;

/// Entry stored in the cache
#[derive(Clone, Debug)]
struct CacheEntry {
    value: Value,
    stored_at: chrono::DateTime<chrono::Utc>,
}

/// In-memory cache client
///
/// Every key is namespaced with `prefix`. Entries older than `ttl` are
/// treated as missing; each write and `cleanup_expired` drop them.
#[derive(Clone)]
pub struct MemoryCache {
    prefix: String,
    ttl: Option<Duration>,
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl MemoryCache {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ttl: None,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Cache configured with the prefix and TTL from `config`
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.cache_prefix.clone()).with_ttl(Some(config.cache_ttl))
    }

    /// Expire entries `ttl` after they were last written
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Number of stored entries, expired ones included
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Clean up expired entries (run periodically)
    pub async fn cleanup_expired(&self) {
        let Some(ttl) = self.ttl else {
            return;
        };

        let mut entries = self.entries.write().await;
        evict_expired(&mut entries, ttl, chrono::Utc::now());
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

fn evict_expired(
    entries: &mut HashMap<String, CacheEntry>,
    ttl: Duration,
    now: chrono::DateTime<chrono::Utc>,
) {
    entries.retain(|_, entry| !is_expired(entry, ttl, now));
}

fn is_expired(entry: &CacheEntry, ttl: Duration, now: chrono::DateTime<chrono::Utc>) -> bool {
    let elapsed = now.signed_duration_since(entry.stored_at);
    match elapsed.to_std() {
        Ok(elapsed) => elapsed >= ttl,
        // Stored "in the future" (clock skew): still fresh
        Err(_) => false,
    }
}

#[async_trait]
impl BaseCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let entries = self.entries.read().await;
        let Some(entry) = entries.get(&self.namespaced(key)) else {
            return Ok(None);
        };

        if let Some(ttl) = self.ttl {
            if is_expired(entry, ttl, chrono::Utc::now()) {
                return Ok(None);
            }
        }

        Ok(Some(entry.value.clone()))
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut entries = self.entries.write().await;
        let now = chrono::Utc::now();
        if let Some(ttl) = self.ttl {
            evict_expired(&mut entries, ttl, now);
        }
        entries.insert(
            self.namespaced(key),
            CacheEntry {
                value,
                stored_at: now,
            },
        );
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.remove(&self.namespaced(key));
        Ok(())
    }
}
