//! Exact-match entry stores.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::RwLock;

use crate::error::CacheError;
use crate::types::CacheEntry;

/// Key-value tier of the cache.
///
/// Entries are idempotent recomputations, so writers follow a
/// single-writer-per-key, last-write-wins convention; no transactional
/// guarantees are needed.
#[allow(async_fn_in_trait)]
pub trait EntryStore {
    /// Fetch the live entry under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError>;

    /// Write `entry` under its own key with the given time-to-live.
    async fn put(&self, entry: &CacheEntry, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// All live keys; used by age-based sweeps.
    async fn keys(&self) -> Result<Vec<String>, CacheError>;
}

struct StoredEntry {
    entry: CacheEntry,
    expires_at: Instant,
}

/// In-memory store: a map with per-entry expiries behind an async lock.
///
/// This is the mandatory no-network fallback; it must behave like the REST
/// store under concurrent pipeline runs.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, StoredEntry>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|s| s.expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl EntryStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|stored| stored.expires_at > Instant::now())
            .map(|stored| stored.entry.clone()))
    }

    async fn put(&self, entry: &CacheEntry, ttl: Duration) -> Result<(), CacheError> {
        let mut entries = self.entries.write().await;
        entries.insert(
            entry.key.clone(),
            StoredEntry {
                entry: entry.clone(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        let mut keys: Vec<String> = entries
            .iter()
            .filter(|(_, stored)| stored.expires_at > now)
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct CommandResponse {
    result: serde_json::Value,
}

/// Upstash-style Redis REST store: one endpoint, bearer token, commands as
/// JSON arrays.
pub struct RestKvStore {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl RestKvStore {
    #[must_use]
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    async fn command(&self, command: &[serde_json::Value]) -> Result<serde_json::Value, CacheError> {
        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.token)
            .json(&command)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CacheError::Store(format!(
                "command returned status {}",
                response.status()
            )));
        }

        let parsed: CommandResponse = response
            .json()
            .await
            .map_err(|e| CacheError::Store(format!("command response parse error: {e}")))?;
        Ok(parsed.result)
    }
}

impl EntryStore for RestKvStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let result = self
            .command(&[serde_json::json!("GET"), serde_json::json!(key)])
            .await?;
        match result {
            serde_json::Value::Null => Ok(None),
            serde_json::Value::String(raw) => {
                let entry: CacheEntry = serde_json::from_str(&raw)?;
                Ok(Some(entry))
            }
            other => Err(CacheError::Store(format!(
                "unexpected GET result shape: {other}"
            ))),
        }
    }

    async fn put(&self, entry: &CacheEntry, ttl: Duration) -> Result<(), CacheError> {
        let raw = serde_json::to_string(entry)?;
        self.command(&[
            serde_json::json!("SET"),
            serde_json::json!(entry.key),
            serde_json::json!(raw),
            serde_json::json!("EX"),
            serde_json::json!(ttl.as_secs().max(1)),
        ])
        .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.command(&[serde_json::json!("DEL"), serde_json::json!(key)])
            .await?;
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        let result = self
            .command(&[serde_json::json!("KEYS"), serde_json::json!("*")])
            .await?;
        let keys: Vec<String> = serde_json::from_value(result)
            .map_err(|e| CacheError::Store(format!("unexpected KEYS result shape: {e}")))?;
        Ok(keys)
    }
}

impl std::fmt::Debug for RestKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestKvStore")
            .field("base_url", &self.base_url)
            .field("token", &"[redacted]")
            .finish()
    }
}
