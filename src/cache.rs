//! Sled-based cache for fetched glossary payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("database error: {0}")]
    DbError(#[from] sled::Error),
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// A cached payload with metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedPayload {
    /// The endpoint the payload was fetched from
    pub url: String,
    /// When the payload was fetched
    pub fetched_at: DateTime<Utc>,
    /// The raw JSON body
    pub body: Value,
}

impl CachedPayload {
    /// Create a new cached payload stamped with the current time
    pub fn new(url: String, body: Value) -> Self {
        Self {
            url,
            fetched_at: Utc::now(),
            body,
        }
    }

    /// Whether the payload is younger than `ttl` at `now`
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => now.signed_duration_since(self.fetched_at) < ttl,
            // a ttl too large to represent never expires
            Err(_) => true,
        }
    }
}

/// Sled-based storage for glossary payloads.
///
/// Payloads are keyed by URL hash.
pub struct PayloadCache {
    db: sled::Db,
}

impl PayloadCache {
    /// Open or create a cache at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CacheError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Store the payload fetched from a URL
    pub fn store(&self, url: &str, body: &Value) -> Result<(), CacheError> {
        let key = Self::hash_url(url);
        let cached = CachedPayload::new(url.to_string(), body.clone());
        self.put(&key, &cached)
    }

    fn put(&self, key: &str, cached: &CachedPayload) -> Result<(), CacheError> {
        let value = serde_json::to_vec(cached)?;
        self.db.insert(key.as_bytes(), value)?;
        self.db.flush()?;
        Ok(())
    }

    /// Retrieve the payload for a URL, however old
    pub fn get(&self, url: &str) -> Result<Option<CachedPayload>, CacheError> {
        let key = Self::hash_url(url);
        match self.db.get(key.as_bytes())? {
            Some(data) => {
                let cached: CachedPayload = serde_json::from_slice(&data)?;
                Ok(Some(cached))
            }
            None => Ok(None),
        }
    }

    /// Retrieve the payload for a URL if it is younger than `ttl`
    pub fn get_fresh(&self, url: &str, ttl: Duration) -> Result<Option<CachedPayload>, CacheError> {
        let now = Utc::now();
        Ok(self.get(url)?.filter(|cached| cached.is_fresh(ttl, now)))
    }

    /// List all cached payloads
    pub fn list_all(&self) -> Result<Vec<CachedPayload>, CacheError> {
        let mut results = Vec::new();
        for item in self.db.iter() {
            let (_key, value) = item?;
            let cached: CachedPayload = serde_json::from_slice(&value)?;
            results.push(cached);
        }
        // Sort by fetched_at descending (newest first)
        results.sort_by(|a, b| b.fetched_at.cmp(&a.fetched_at));
        Ok(results)
    }

    /// Delete the payload for a URL
    pub fn remove(&self, url: &str) -> Result<bool, CacheError> {
        let key = Self::hash_url(url);
        let existed = self.db.remove(key.as_bytes())?.is_some();
        self.db.flush()?;
        Ok(existed)
    }

    /// Delete every cached payload
    pub fn clear(&self) -> Result<(), CacheError> {
        self.db.clear()?;
        self.db.flush()?;
        Ok(())
    }

    /// Get the number of cached payloads
    pub fn count(&self) -> usize {
        self.db.len()
    }

    /// Create a hash of the URL for use as a key
    fn hash_url(url: &str) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};
        let mut hasher = DefaultHasher::new();
        url.hash(&mut hasher);
        format!("{:x}", hasher.finish())
    }
}
